use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use super::roster::RosterState;
use super::types::{AssignmentKind, ParticipantId};

/// Advisory raised by the fairness audit. Purely informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advisory {
    Imbalance {
        overloaded_id: ParticipantId,
        overloaded_name: String,
        underloaded_id: ParticipantId,
        underloaded_name: String,
        count_gap: usize,
        weight_gap: f64,
        /// Days the underloaded participant could still take
        absorbable_days: usize,
    },
    UncoveredDays { dates: Vec<NaiveDate> },
    ForcedAssignments { dates: Vec<NaiveDate> },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Imbalance {
                overloaded_name,
                underloaded_name,
                count_gap,
                weight_gap,
                absorbable_days,
                ..
            } => write!(
                f,
                "{} carries noticeably more duty than {} (count gap {}, weight gap {:.2}); {} could still take {} more day(s)",
                overloaded_name, underloaded_name, count_gap, weight_gap, underloaded_name, absorbable_days
            ),
            Advisory::UncoveredDays { dates } => write!(
                f,
                "{} day(s) could not be covered: {}",
                dates.len(),
                join_dates(dates)
            ),
            Advisory::ForcedAssignments { dates } => write!(
                f,
                "{} day(s) were assigned with fairness rules waived: {}",
                dates.len(),
                join_dates(dates)
            ),
        }
    }
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load spread across the roster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSpread {
    pub max_count: usize,
    pub min_count: usize,
    pub max_weight: f64,
    pub min_weight: f64,
}

impl LoadSpread {
    pub fn count_gap(&self) -> usize {
        self.max_count - self.min_count
    }

    pub fn weight_gap(&self) -> f64 {
        self.max_weight - self.min_weight
    }
}

pub fn load_spread(state: &RosterState, config: &EngineConfig) -> Option<LoadSpread> {
    if state.participant_count() == 0 {
        return None;
    }
    let counts: Vec<usize> = (0..state.participant_count()).map(|i| state.duty_count(i)).collect();
    let weights: Vec<f64> = (0..state.participant_count())
        .map(|i| state.duty_weight(i, config))
        .collect();

    Some(LoadSpread {
        max_count: counts.iter().copied().max().unwrap_or(0),
        min_count: counts.iter().copied().min().unwrap_or(0),
        max_weight: weights.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_weight: weights.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

/// Period days the participant is available for, does not hold, and that do not
/// touch one of their duty days
pub fn absorbable_days(state: &RosterState, participant: usize) -> usize {
    let p = state.participant(participant);
    state
        .days()
        .iter()
        .filter(|d| p.is_available(d.date) && !p.holds(d.date) && !state.holds_neighbour(participant, d.date))
        .count()
}

/// Read-only fairness check over the current assignments.
///
/// The imbalance advisory fires when either gap exceeds its threshold and the least
/// loaded participant (by weight when the weight gap trips, by count otherwise) still
/// has an absorbable day.
pub fn audit(state: &RosterState, config: &EngineConfig) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    let Some(spread) = load_spread(state, config) else {
        return advisories;
    };

    let weight_tripped = spread.weight_gap() > config.audit_weight_gap;
    let count_tripped = spread.count_gap() > config.audit_count_gap as usize;

    if weight_tripped || count_tripped {
        let (over, under) = if weight_tripped {
            extremes_by(state, |i| state.duty_weight(i, config))
        } else {
            extremes_by(state, |i| state.duty_count(i) as f64)
        };
        let absorbable = absorbable_days(state, under);
        if absorbable > 0 {
            let over_p = state.participant(over);
            let under_p = state.participant(under);
            advisories.push(Advisory::Imbalance {
                overloaded_id: over_p.id.clone(),
                overloaded_name: over_p.name.clone(),
                underloaded_id: under_p.id.clone(),
                underloaded_name: under_p.name.clone(),
                count_gap: spread.count_gap(),
                weight_gap: spread.weight_gap(),
                absorbable_days: absorbable,
            });
        }
    }

    let schedule = state.to_schedule();
    let uncovered = schedule.unassigned_dates();
    if !uncovered.is_empty() {
        advisories.push(Advisory::UncoveredDays { dates: uncovered });
    }
    let forced = schedule.dates_of_kind(AssignmentKind::Forced);
    if !forced.is_empty() {
        advisories.push(Advisory::ForcedAssignments { dates: forced });
    }

    advisories
}

/// (highest, lowest) by the given load measure; ties go to the lower id
fn extremes_by<F>(state: &RosterState, load: F) -> (usize, usize)
where
    F: Fn(usize) -> f64,
{
    let mut over = 0;
    let mut under = 0;
    for i in 1..state.participant_count() {
        let id = &state.participant(i).id;
        let l = load(i);
        let over_l = load(over);
        if l > over_l || (l == over_l && id < &state.participant(over).id) {
            over = i;
        }
        let under_l = load(under);
        if l < under_l || (l == under_l && id < &state.participant(under).id) {
            under = i;
        }
    }
    (over, under)
}
