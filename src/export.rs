use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::schedule::calendar::weekday_name;
use crate::schedule::types::{Participant, Schedule};

const PALETTE: [&str; 12] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4",
    "#46f0f0", "#f032e6", "#bcf60c", "#fabebe", "#008080", "#e6beff",
];

/// Colour per participant id. The palette order is shuffled by `seed`, then handed out
/// in id order, wrapping around when there are more participants than colours.
pub fn participant_colours(schedule: &Schedule, seed: u64) -> BTreeMap<String, &'static str> {
    let mut palette = PALETTE.to_vec();
    palette.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut colours = BTreeMap::new();
    for a in &schedule.assignments {
        if let Some(id) = &a.participant_id {
            colours.entry(id.clone()).or_insert("");
        }
    }
    for (i, colour) in colours.values_mut().enumerate() {
        *colour = palette[i % palette.len()];
    }
    colours
}

/// Writes one row per day: date, weekday, participant, id, kind, weight, colour
pub fn write_schedule_csv<W: Write>(schedule: &Schedule, writer: W, seed: u64) -> Result<()> {
    let colours = participant_colours(schedule, seed);
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(["date", "weekday", "participant", "id", "kind", "weight", "colour"])?;
    for a in &schedule.assignments {
        let id = a.participant_id.as_deref().unwrap_or("");
        let colour = colours.get(id).copied().unwrap_or("");
        wtr.write_record([
            a.date.to_string().as_str(),
            weekday_name(a.weekday),
            a.holder_label(),
            id,
            a.kind.label(),
            format!("{:.2}", a.weight).as_str(),
            colour,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_schedule_to_csv(schedule: &Schedule, csv_path: &Path, seed: u64) -> Result<()> {
    let file = std::fs::File::create(csv_path)?;
    write_schedule_csv(schedule, file, seed)
}

/// Writes one row per participant with their load and per-weekday counts
pub fn export_summary_to_csv(participants: &[Participant], config: &EngineConfig, csv_path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(csv_path)?;

    let mut header = vec!["id".to_string(), "name".to_string(), "duty_count".to_string(), "duty_weight".to_string()];
    header.extend((0..7).map(|wd| weekday_name(wd).to_lowercase()));
    wtr.write_record(&header)?;

    for p in participants {
        let mut row = vec![
            p.id.clone(),
            p.name.clone(),
            p.duty_count().to_string(),
            format!("{:.2}", p.duty_weight(config)),
        ];
        row.extend((0..7).map(|wd| p.weekday_duty_count(wd).to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
