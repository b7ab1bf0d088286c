use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use super::constraints::{ConstraintEvaluator, PRIMARY_RULES};
use super::priority::{order_days, order_participants};
use super::roster::RosterState;
use super::types::{AssignmentKind, CalendarDay};

/// Where a day stands during the greedy pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Pending,
    /// `slot` is the position in this pass's participant order
    Attempting { slot: usize },
    Assigned { participant: usize },
    Skipped,
}

/// Outcome of one greedy pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub assigned: usize,
    pub skipped: Vec<NaiveDate>,
}

/// Single-candidate-per-day greedy fill.
///
/// One rotating cursor walks the participant order. A day goes to the participant under
/// the cursor if every rule passes; the cursor stays put so the same participant is
/// tried first on the next day. On any violation the cursor advances and the day is
/// skipped for this pass, left to the repair cycles.
pub fn run_primary_pass(mut state: RosterState, config: &EngineConfig) -> (RosterState, PassReport) {
    let mut report = PassReport::default();
    if state.is_empty() {
        return (state, report);
    }

    let evaluator = ConstraintEvaluator::new(&state, config);
    let participants = order_participants(&state, config);
    let pending: Vec<CalendarDay> = {
        let open = state.unassigned_days();
        order_days(&open, config).into_iter().cloned().collect()
    };

    let mut cursor = 0usize;
    for day in &pending {
        let mut day_state = DayState::Pending;
        trace!(date = %day.date, ?day_state, "visiting day");

        day_state = DayState::Attempting { slot: cursor };
        trace!(date = %day.date, ?day_state);

        let candidate = participants[cursor];
        day_state = match evaluator.first_violation(&state, candidate, day, PRIMARY_RULES) {
            None => {
                state.assign(candidate, day.date, AssignmentKind::Primary);
                DayState::Assigned { participant: candidate }
            }
            Some(rule) => {
                trace!(
                    date = %day.date,
                    participant = %state.participant(candidate).id,
                    %rule,
                    hard = rule.is_hard(),
                    "candidate rejected"
                );
                cursor = (cursor + 1) % participants.len();
                DayState::Skipped
            }
        };
        trace!(date = %day.date, ?day_state);

        match day_state {
            DayState::Assigned { .. } => report.assigned += 1,
            _ => report.skipped.push(day.date),
        }
    }

    report.skipped.sort();
    debug!(
        assigned = report.assigned,
        skipped = report.skipped.len(),
        "primary pass finished"
    );
    (state, report)
}
