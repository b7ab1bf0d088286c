use std::cmp::Ordering;

use crate::config::EngineConfig;
use super::roster::RosterState;
use super::types::CalendarDay;

/// Days in fill order: weekday priority from the config, then calendar order
pub fn order_days<'s>(days: &[&'s CalendarDay], config: &EngineConfig) -> Vec<&'s CalendarDay> {
    let mut ordered: Vec<&CalendarDay> = days.to_vec();
    ordered.sort_by(|a, b| {
        config
            .day_rank(a.weekday)
            .cmp(&config.day_rank(b.weekday))
            .then(a.date.cmp(&b.date))
    });
    ordered
}

/// Participant indices for the greedy pass.
///
/// Scarcest first (most unavailable days inside the period), then the lightest
/// by count and by weight; the id settles anything left.
pub fn order_participants(state: &RosterState, config: &EngineConfig) -> Vec<usize> {
    let mut order: Vec<usize> = (0..state.participant_count()).collect();
    order.sort_by(|&a, &b| {
        state
            .unavailable_in_period(b)
            .cmp(&state.unavailable_in_period(a))
            .then_with(|| compare_load(state, config, a, b))
    });
    order
}

/// Participant indices for a repair cycle: lightest load first
pub fn order_for_backfill(state: &RosterState, config: &EngineConfig) -> Vec<usize> {
    let mut order: Vec<usize> = (0..state.participant_count()).collect();
    order.sort_by(|&a, &b| compare_load(state, config, a, b));
    order
}

/// Uncovered days for a repair cycle: heaviest weekday first
pub fn order_unassigned_days<'s>(days: &[&'s CalendarDay]) -> Vec<&'s CalendarDay> {
    let mut ordered: Vec<&CalendarDay> = days.to_vec();
    ordered.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.date.cmp(&b.date)));
    ordered
}

/// Ascending count, then ascending weight, then id
fn compare_load(state: &RosterState, config: &EngineConfig, a: usize, b: usize) -> Ordering {
    state
        .duty_count(a)
        .cmp(&state.duty_count(b))
        .then_with(|| {
            state
                .duty_weight(a, config)
                .total_cmp(&state.duty_weight(b, config))
        })
        .then_with(|| state.participant(a).id.cmp(&state.participant(b).id))
}
