use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::schedule::calendar::format_date_label;
use crate::schedule::types::{Assignment, AssignmentKind, Participant, Schedule};
use crate::schedule::RunOutcome;

/// Holder name plus a marker for anything not placed by the greedy pass
pub fn format_holder(assignment: &Assignment) -> String {
    match assignment.kind {
        AssignmentKind::Primary | AssignmentKind::Unassigned => assignment.holder_label().to_string(),
        kind => format!("{} [{}]", assignment.holder_label(), kind.label()),
    }
}

/// Writes the schedule to a file, one line per day: "dd.mm.yyyy (Weekday) name"
pub fn write_schedule_to_file(title: &str, schedule: &Schedule, filename: &Path) -> Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "** {} **", title)?;
    for a in &schedule.assignments {
        writeln!(file, "{} {}", format_date_label(a.date, a.weekday), format_holder(a))?;
    }

    Ok(())
}

/// Prints the schedule in a readable format
pub fn print_schedule(title: &str, schedule: &Schedule) {
    println!("\n=== {} ===", title);
    let unassigned = schedule.unassigned_dates();
    println!(
        "Days: {}, assigned: {}",
        schedule.len(),
        schedule.len() - unassigned.len()
    );
    if !unassigned.is_empty() {
        println!("⚠️  Unassigned days ({}):", unassigned.len());
        for date in &unassigned {
            if let Some(a) = schedule.get(*date) {
                println!("  - {}", format_date_label(a.date, a.weekday));
            }
        }
    }

    println!();
    for a in &schedule.assignments {
        println!("  {} -> {} (weight {:.2})", format_date_label(a.date, a.weekday), format_holder(a), a.weight);
    }
}

/// Prints per-participant load, heaviest first
pub fn print_load_summary(participants: &[Participant], config: &EngineConfig) {
    let mut rows: Vec<(&Participant, f64)> = participants.iter().map(|p| (p, p.duty_weight(config))).collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

    println!("\n=== Load summary ===");
    for (p, weight) in rows {
        println!(
            "  {} (ID: {}) -> {} day(s), weight {:.2}",
            p.name,
            p.id,
            p.duty_count(),
            weight
        );
    }
}

pub fn print_advisories(outcome: &RunOutcome) {
    if outcome.advisories.is_empty() {
        return;
    }
    println!("\n=== Advisories ===");
    for message in outcome.advisory_messages() {
        println!("  - {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn assignment(kind: AssignmentKind, name: Option<&str>) -> Assignment {
        Assignment {
            date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            weekday: 0,
            weight: 1.5,
            participant_id: name.map(|n| n.to_lowercase()),
            participant_name: name.map(str::to_string),
            kind,
        }
    }

    #[test]
    fn labels_and_markers() {
        let a = assignment(AssignmentKind::Forced, Some("Ayse"));
        assert_eq!(format_date_label(a.date, a.weekday), "07.01.2024 (Sunday)");
        assert_eq!(format_holder(&a), "Ayse [forced]");
        assert_eq!(format_holder(&assignment(AssignmentKind::Primary, Some("Ayse"))), "Ayse");
        assert_eq!(format_holder(&assignment(AssignmentKind::Unassigned, None)), "Unassigned");
    }

    #[test]
    fn schedule_file_has_a_line_per_day() {
        let schedule = Schedule {
            assignments: vec![assignment(AssignmentKind::Backfill, Some("Baris"))],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.txt");
        write_schedule_to_file("Duty roster", &schedule, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "** Duty roster **\n07.01.2024 (Sunday) Baris [backfill]\n");
    }
}
