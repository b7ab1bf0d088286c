use std::fmt;

use chrono::{Days, NaiveDate};

use crate::config::{EngineConfig, SATURDAY, SUNDAY, THURSDAY};
use super::roster::RosterState;
use super::types::{weekday_of, CalendarDay};

/// A rule a candidate (participant, day) pair must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    Availability,
    NoConsecutive,
    SingleWeekdayShift,
    ThursdayWeekend,
    CountBalance,
    WeightBalance,
}

impl Constraint {
    pub fn is_hard(&self) -> bool {
        !matches!(self, Constraint::CountBalance | Constraint::WeightBalance)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Constraint::Availability => "availability",
            Constraint::NoConsecutive => "no-consecutive-duty",
            Constraint::SingleWeekdayShift => "single-weekday-shift",
            Constraint::ThursdayWeekend => "thursday-weekend-linkage",
            Constraint::CountBalance => "count-balance",
            Constraint::WeightBalance => "weight-balance",
        };
        f.write_str(name)
    }
}

/// Everything, used by the greedy pass
pub const PRIMARY_RULES: &[Constraint] = &[
    Constraint::Availability,
    Constraint::NoConsecutive,
    Constraint::SingleWeekdayShift,
    Constraint::ThursdayWeekend,
    Constraint::CountBalance,
    Constraint::WeightBalance,
];

/// Relaxed repair cycles drop weight balance
pub const BACKFILL_RULES: &[Constraint] = &[
    Constraint::Availability,
    Constraint::NoConsecutive,
    Constraint::CountBalance,
    Constraint::SingleWeekdayShift,
    Constraint::ThursdayWeekend,
];

/// Hard mode keeps only what can never be waived
pub const HARD_MODE_RULES: &[Constraint] = &[Constraint::Availability, Constraint::NoConsecutive];

/// Feasibility of the receiving side of a swap
pub const SWAP_RULES: &[Constraint] = &[Constraint::Availability, Constraint::NoConsecutive];

/// Answers "may participant p take this day" against a partial schedule.
///
/// The averages are taken once from the full roster and day set; they do not move
/// while assignments accumulate.
#[derive(Debug, Clone)]
pub struct ConstraintEvaluator<'a> {
    config: &'a EngineConfig,
    average_count: f64,
    average_weight: f64,
}

impl<'a> ConstraintEvaluator<'a> {
    pub fn new(state: &RosterState, config: &'a EngineConfig) -> Self {
        Self {
            config,
            average_count: state.average_duty_count(),
            average_weight: state.average_duty_weight(),
        }
    }

    pub fn average_count(&self) -> f64 {
        self.average_count
    }

    pub fn average_weight(&self) -> f64 {
        self.average_weight
    }

    /// First rule in `rules` the candidate breaks, if any
    pub fn first_violation(
        &self,
        state: &RosterState,
        participant: usize,
        day: &CalendarDay,
        rules: &[Constraint],
    ) -> Option<Constraint> {
        rules
            .iter()
            .copied()
            .find(|&rule| !self.satisfies(state, participant, day, rule))
    }

    pub fn admits(
        &self,
        state: &RosterState,
        participant: usize,
        day: &CalendarDay,
        rules: &[Constraint],
    ) -> bool {
        self.first_violation(state, participant, day, rules).is_none()
    }

    pub fn satisfies(
        &self,
        state: &RosterState,
        participant: usize,
        day: &CalendarDay,
        rule: Constraint,
    ) -> bool {
        match rule {
            Constraint::Availability => state.participant(participant).is_available(day.date),
            Constraint::NoConsecutive => !state.holds_neighbour(participant, day.date),
            Constraint::SingleWeekdayShift => self.single_weekday_ok(state, participant, day),
            Constraint::ThursdayWeekend => self.thursday_weekend_ok(state, participant, day),
            Constraint::CountBalance => {
                state.duty_count(participant) as f64 + self.config.count_tolerance
                    <= self.average_count
            }
            Constraint::WeightBalance => {
                state.duty_weight(participant, self.config) + self.config.weight_tolerance
                    < self.average_weight
            }
        }
    }

    fn single_weekday_ok(&self, state: &RosterState, participant: usize, day: &CalendarDay) -> bool {
        if !self.config.is_peak(day.weekday) {
            return true;
        }
        let p = state.participant(participant);
        !p.assigned_dates
            .iter()
            .any(|&d| d != day.date && weekday_of(d) == day.weekday)
    }

    fn thursday_weekend_ok(&self, state: &RosterState, participant: usize, day: &CalendarDay) -> bool {
        if !self.config.thursday_weekend_linkage {
            return true;
        }
        let linked: Vec<NaiveDate> = match day.weekday {
            // the following Saturday and Sunday
            THURSDAY => [2u64, 3]
                .iter()
                .filter_map(|&n| day.date.checked_add_days(Days::new(n)))
                .collect(),
            // the preceding Thursday
            SATURDAY => day.date.checked_sub_days(Days::new(2)).into_iter().collect(),
            SUNDAY => day.date.checked_sub_days(Days::new(3)).into_iter().collect(),
            _ => Vec::new(),
        };
        !linked.iter().any(|&d| state.holds(participant, d))
    }
}
