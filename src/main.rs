use std::path::PathBuf;

use duty_roster::display::{print_advisories, print_load_summary, print_schedule, write_schedule_to_file};
use duty_roster::export::{export_schedule_to_csv, export_summary_to_csv};
use duty_roster::parser::{load_roster, PeriodSpec, Roster};
use duty_roster::storage::JsonStore;
use duty_roster::web::{self, RosterService};
use duty_roster::{logging, DutyRosterEngine, EngineConfig};

const USAGE: &str = "usage:
  duty-roster <roster.json> [--config <file>] [--out <schedule.csv>] [--summary <file>] [--text <file>] [--save <roster.json>] [--no-hard-mode]
  duty-roster web [port] [--config <file>] [--store <roster.json>]";

#[derive(Debug, Default)]
struct CliOptions {
    positional: Vec<String>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    summary: Option<PathBuf>,
    text: Option<PathBuf>,
    save: Option<PathBuf>,
    store: Option<PathBuf>,
    no_hard_mode: bool,
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .map(PathBuf::from)
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--config" => opts.config = Some(value("--config")?),
            "--out" => opts.out = Some(value("--out")?),
            "--summary" => opts.summary = Some(value("--summary")?),
            "--text" => opts.text = Some(value("--text")?),
            "--save" => opts.save = Some(value("--save")?),
            "--store" => opts.store = Some(value("--store")?),
            "--no-hard-mode" => opts.no_hard_mode = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            _ => opts.positional.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn load_config(opts: &CliOptions) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &opts.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::from_env()?,
    };
    if opts.no_hard_mode {
        config.hard_mode_fallback = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };

    // Check if we should run in web mode
    if opts.positional.first().map(String::as_str) == Some("web") {
        let port = opts
            .positional
            .get(1)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        let engine = DutyRosterEngine::new(load_config(&opts)?)?;

        let store = opts.store.clone().map(JsonStore::new);
        let roster = match &store {
            Some(store) => store.load(engine.config())?,
            None => None,
        }
        .unwrap_or_else(|| Roster {
            period: PeriodSpec::Dates { dates: vec![] },
            participants: vec![],
        });

        println!("Starting web server on port {}...", port);
        println!("Access the API at http://localhost:{}/api/schedule", port);
        if let Some(store) = &store {
            println!("Roster changes are saved to {}", store.path().display());
        }

        let service = RosterService::new(engine, roster, store)?;
        web::start_server(port, service).await?;
        return Ok(());
    }

    let Some(roster_path) = opts.positional.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let engine = DutyRosterEngine::new(load_config(&opts)?)?;
    let config = engine.config();

    println!("Loading roster from {}...", roster_path);
    let mut roster = load_roster(roster_path, config)?;
    let days = roster.days(config)?;
    println!(
        "Loaded {} participant(s) over {} day(s)",
        roster.participants.len(),
        days.len()
    );

    println!("\n\n=== Running Duty Roster Engine ===");
    let outcome = engine.run(roster.participants.clone(), days);

    print_schedule("Duty Roster", &outcome.schedule);
    print_load_summary(&outcome.participants, config);
    print_advisories(&outcome);

    if let Some(path) = &opts.out {
        export_schedule_to_csv(&outcome.schedule, path, config.seed)?;
        println!("\nSchedule saved to {}", path.display());
    }
    if let Some(path) = &opts.summary {
        export_summary_to_csv(&outcome.participants, config, path)?;
        println!("Summary saved to {}", path.display());
    }
    if let Some(path) = &opts.text {
        write_schedule_to_file("Duty Roster", &outcome.schedule, path)?;
        println!("Text schedule saved to {}", path.display());
    }
    if let Some(path) = &opts.save {
        roster.apply_assignments(&outcome.participants);
        let store = JsonStore::new(path.clone());
        store.save(&roster)?;
        println!("Roster saved to {}", store.path().display());
    }

    Ok(())
}
