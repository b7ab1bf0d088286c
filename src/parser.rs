use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::schedule::calendar::{days_between, days_from_dates, parse_date};
use crate::schedule::types::{CalendarDay, Participant};

/// Roster period: an inclusive range or an explicit list of dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeriodSpec {
    Range { start: NaiveDate, end: NaiveDate },
    Dates { dates: Vec<NaiveDate> },
}

impl PeriodSpec {
    pub fn days(&self, config: &EngineConfig) -> Result<Vec<CalendarDay>> {
        match self {
            PeriodSpec::Range { start, end } => days_between(*start, *end, config),
            PeriodSpec::Dates { dates } => Ok(days_from_dates(dates, config)),
        }
    }
}

/// A participant as written in a roster file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticipantRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub unavailable_dates: Vec<NaiveDate>,
    /// When given, the participant can only take these days
    #[serde(default)]
    pub available_dates: Option<Vec<NaiveDate>>,
    #[serde(default)]
    pub assigned_dates: Vec<NaiveDate>,
}

impl ParticipantRecord {
    /// Availability is kept as written so it still holds after the period changes
    pub fn into_participant(self, id: String) -> Participant {
        let mut assigned = self.assigned_dates;
        assigned.sort();
        assigned.dedup();

        Participant {
            id,
            name: self.name.trim().to_string(),
            unavailable_dates: self.unavailable_dates.into_iter().collect(),
            available_dates: self.available_dates.map(|dates| dates.into_iter().collect()),
            assigned_dates: assigned,
        }
    }

    fn given_id(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Seeded source of participant ids for records that arrive without one
#[derive(Debug, Clone)]
pub struct IdGenerator {
    rng: StdRng,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A fresh id not present in `taken`
    pub fn next_id(&mut self, taken: &HashSet<String>) -> String {
        loop {
            let id = format!("p{:08x}", self.rng.gen::<u32>());
            if !taken.contains(&id) {
                return id;
            }
        }
    }
}

/// A roster: the period plus everyone on it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    pub period: PeriodSpec,
    pub participants: Vec<Participant>,
}

#[derive(Deserialize)]
struct RosterFile {
    period: PeriodSpec,
    #[serde(default)]
    participants: Vec<ParticipantRecord>,
}

impl Roster {
    pub fn days(&self, config: &EngineConfig) -> Result<Vec<CalendarDay>> {
        self.period.days(config)
    }

    pub fn ids(&self) -> HashSet<String> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }

    /// Adds or replaces a participant by id; returns true if one was replaced
    pub fn upsert(&mut self, participant: Participant) -> bool {
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => {
                *existing = participant;
                true
            }
            None => {
                self.participants.push(participant);
                false
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        self.participants.len() != before
    }

    /// Copies assigned dates back from engine output, matching by id
    pub fn apply_assignments(&mut self, updated: &[Participant]) {
        let by_id: HashMap<&str, &Participant> = updated.iter().map(|p| (p.id.as_str(), p)).collect();
        for p in &mut self.participants {
            p.assigned_dates = by_id
                .get(p.id.as_str())
                .map(|u| u.assigned_dates.clone())
                .unwrap_or_default();
        }
    }
}

/// Parses roster JSON; participants without an id get a seeded generated one
pub fn parse_roster(raw: &str, config: &EngineConfig) -> Result<Roster> {
    let file: RosterFile = serde_json::from_str(raw)?;
    file.period.days(config)?;

    let mut taken: HashSet<String> = file.participants.iter().filter_map(|r| r.given_id()).collect();
    let mut ids = IdGenerator::new(config.seed);

    let participants = file
        .participants
        .into_iter()
        .map(|record| {
            let id = match record.given_id() {
                Some(id) => id,
                None => {
                    let id = ids.next_id(&taken);
                    debug!(name = %record.name, %id, "generated participant id");
                    taken.insert(id.clone());
                    id
                }
            };
            record.into_participant(id)
        })
        .collect();

    Ok(Roster {
        period: file.period,
        participants,
    })
}

/// Loads a roster JSON file
pub fn load_roster<P: AsRef<Path>>(path: P, config: &EngineConfig) -> Result<Roster> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let roster = parse_roster(&raw, config)?;
    debug!(
        path = %path.as_ref().display(),
        participants = roster.participants.len(),
        "loaded roster"
    );
    Ok(roster)
}

#[derive(Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    #[serde(default)]
    unavailable: String,
}

/// Loads participants from `id,name,unavailable` rows, unavailable dates separated by `;`.
///
/// A later row with the same id replaces the earlier one; rows missing an id or name are skipped.
pub fn load_participants_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Participant>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    // resubmissions replace in place so the first-seen order is kept
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut participants: Vec<Participant> = Vec::new();

    for row in reader.deserialize() {
        let row: CsvRow = row?;
        if row.id.is_empty() || row.name.is_empty() {
            warn!(id = %row.id, name = %row.name, "skipping incomplete participant row");
            continue;
        }

        let unavailable = row
            .unavailable
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_date)
            .collect::<Result<Vec<NaiveDate>>>()?;
        let participant = Participant::new(row.id.clone(), row.name).with_unavailable(unavailable);

        match index_by_id.get(&row.id) {
            Some(&idx) => {
                debug!(id = %row.id, "resubmitted participant replaces earlier row");
                participants[idx] = participant;
            }
            None => {
                index_by_id.insert(row.id, participants.len());
                participants.push(participant);
            }
        }
    }

    Ok(participants)
}
