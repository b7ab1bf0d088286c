use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

pub type ParticipantId = String;

/// Label used wherever a day has no holder
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// One date of the roster period that needs exactly one holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
    pub weight: f64,
}

impl CalendarDay {
    pub fn new(date: NaiveDate, config: &EngineConfig) -> Self {
        let weekday = weekday_of(date);
        Self {
            date,
            weekday,
            weight: config.weight_of(weekday),
        }
    }
}

/// Sunday-first weekday index of a date
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// A roster member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub unavailable_dates: BTreeSet<NaiveDate>,
    /// Whitelist as entered; `None` means every day not listed as unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_dates: Option<BTreeSet<NaiveDate>>,
    /// Current duty days, kept in date order
    #[serde(default)]
    pub assigned_dates: Vec<NaiveDate>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unavailable_dates: BTreeSet::new(),
            available_dates: None,
            assigned_dates: Vec::new(),
        }
    }

    pub fn with_unavailable<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.unavailable_dates.extend(dates);
        self
    }

    /// Restricts the participant to the given days, whatever the period
    pub fn with_available<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.available_dates.get_or_insert_with(BTreeSet::new).extend(dates);
        self
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.unavailable_dates.contains(&date)
            && self.available_dates.as_ref().map_or(true, |only| only.contains(&date))
    }

    pub fn holds(&self, date: NaiveDate) -> bool {
        self.assigned_dates.binary_search(&date).is_ok()
    }

    pub fn duty_count(&self) -> usize {
        self.assigned_dates.len()
    }

    pub fn duty_weight(&self, config: &EngineConfig) -> f64 {
        self.assigned_dates
            .iter()
            .map(|&d| config.weight_of(weekday_of(d)))
            .sum()
    }

    /// Number of duties falling on the given weekday
    pub fn weekday_duty_count(&self, weekday: u8) -> usize {
        self.assigned_dates
            .iter()
            .filter(|&&d| weekday_of(d) == weekday)
            .count()
    }

    pub(crate) fn add_duty(&mut self, date: NaiveDate) {
        if let Err(pos) = self.assigned_dates.binary_search(&date) {
            self.assigned_dates.insert(pos, date);
        }
    }

    pub(crate) fn remove_duty(&mut self, date: NaiveDate) {
        if let Ok(pos) = self.assigned_dates.binary_search(&date) {
            self.assigned_dates.remove(pos);
        }
    }
}

/// How a day came to be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    /// Placed by the greedy pass
    Primary,
    /// Placed by a relaxed repair cycle
    Backfill,
    /// Placed by hard mode with every fairness rule dropped
    Forced,
    /// Moved by the rebalancer
    Rebalanced,
    /// Kept from the schedule a repair run started from
    Retained,
    Unassigned,
}

impl AssignmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            AssignmentKind::Primary => "primary",
            AssignmentKind::Backfill => "backfill",
            AssignmentKind::Forced => "forced",
            AssignmentKind::Rebalanced => "rebalanced",
            AssignmentKind::Retained => "retained",
            AssignmentKind::Unassigned => "unassigned",
        }
    }
}

/// Result for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub weekday: u8,
    pub weight: f64,
    pub participant_id: Option<ParticipantId>,
    pub participant_name: Option<String>,
    pub kind: AssignmentKind,
}

impl Assignment {
    pub fn is_assigned(&self) -> bool {
        self.participant_id.is_some()
    }

    pub fn holder_label(&self) -> &str {
        self.participant_name.as_deref().unwrap_or(UNASSIGNED_LABEL)
    }
}

/// Date-ordered assignments for the whole period, one per day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Assignment> {
        self.assignments
            .binary_search_by_key(&date, |a| a.date)
            .ok()
            .map(|i| &self.assignments[i])
    }

    pub fn unassigned_dates(&self) -> Vec<NaiveDate> {
        self.assignments
            .iter()
            .filter(|a| !a.is_assigned())
            .map(|a| a.date)
            .collect()
    }

    pub fn dates_of_kind(&self, kind: AssignmentKind) -> Vec<NaiveDate> {
        self.assignments
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.date)
            .collect()
    }

    pub fn dates_for(&self, participant_id: &str) -> Vec<NaiveDate> {
        self.assignments
            .iter()
            .filter(|a| a.participant_id.as_deref() == Some(participant_id))
            .map(|a| a.date)
            .collect()
    }
}

/// One exchange of duty days between two participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    /// Most loaded participant, gives up `heavy_date`
    pub heavy_participant: ParticipantId,
    pub heavy_date: NaiveDate,
    /// Least loaded participant, gives up `light_date`
    pub light_participant: ParticipantId,
    pub light_date: NaiveDate,
}
