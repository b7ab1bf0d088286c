use chrono::NaiveDate;
use tracing::debug;

use crate::config::EngineConfig;
use super::constraints::{ConstraintEvaluator, SWAP_RULES};
use super::roster::{Holding, RosterState};
use super::types::{AssignmentKind, Swap};

/// Most and least loaded participants by duty weight; ties go to the lower id
pub fn load_extremes(state: &RosterState, config: &EngineConfig) -> Option<(usize, usize)> {
    let count = state.participant_count();
    if count == 0 {
        return None;
    }

    let key = |i: usize| (state.duty_weight(i, config), state.participant(i).id.as_str());
    let heaviest = (0..count).max_by(|&a, &b| {
        let (wa, ia) = key(a);
        let (wb, ib) = key(b);
        wa.total_cmp(&wb).then(ib.cmp(ia))
    })?;
    let lightest = (0..count).min_by(|&a, &b| {
        let (wa, ia) = key(a);
        let (wb, ib) = key(b);
        wa.total_cmp(&wb).then(ia.cmp(ib))
    })?;
    Some((heaviest, lightest))
}

/// One hill-climbing step on the weight gap.
///
/// Tries every (heavy day, light day) pair where the light participant's day is strictly
/// lighter, exchanges the first pair both receivers can take and that shrinks the
/// roster-wide gap, and stops. Returns the state untouched when no such pair exists.
pub fn rebalance_once(mut state: RosterState, config: &EngineConfig) -> (RosterState, Option<Swap>) {
    let Some((heavy, light)) = load_extremes(&state, config) else {
        return (state, None);
    };
    let gap_before = state.weight_gap(config);
    if heavy == light || gap_before <= 0.0 {
        return (state, None);
    }

    let evaluator = ConstraintEvaluator::new(&state, config);
    let heavy_dates = state.participant(heavy).assigned_dates.clone();
    let light_dates = state.participant(light).assigned_dates.clone();

    for &heavy_date in &heavy_dates {
        for &light_date in &light_dates {
            let (Some(heavy_day), Some(light_day)) =
                (state.day(heavy_date).cloned(), state.day(light_date).cloned())
            else {
                continue;
            };
            if light_day.weight >= heavy_day.weight {
                continue;
            }

            let (heavy_holding, light_holding) = match (state.holding(heavy_date), state.holding(light_date)) {
                (Some(h), Some(l)) => (h, l),
                _ => continue,
            };

            exchange(&mut state, heavy_date, heavy_holding, light_date, light_holding);

            let feasible = evaluator.admits(&state, light, &heavy_day, SWAP_RULES)
                && evaluator.admits(&state, heavy, &light_day, SWAP_RULES);
            let gap_after = state.weight_gap(config);

            if feasible && gap_after < gap_before {
                let swap = Swap {
                    heavy_participant: state.participant(heavy).id.clone(),
                    heavy_date,
                    light_participant: state.participant(light).id.clone(),
                    light_date,
                };
                debug!(?swap, gap_before, gap_after, "rebalanced");
                return (state, Some(swap));
            }

            restore(&mut state, heavy_date, heavy_holding, light_date, light_holding);
        }
    }

    debug!(gap = gap_before, "no feasible swap");
    (state, None)
}

/// A moved day stays `Forced` if hard mode placed it, so the audit still reports it
fn moved_kind(previous: Holding) -> AssignmentKind {
    match previous.kind {
        AssignmentKind::Forced => AssignmentKind::Forced,
        _ => AssignmentKind::Rebalanced,
    }
}

/// Hands each day to the other holder, leaving both days unheld first so neither
/// receiver is judged against the day it is giving up
fn exchange(state: &mut RosterState, heavy_date: NaiveDate, heavy_holding: Holding, light_date: NaiveDate, light_holding: Holding) {
    state.unassign(heavy_date);
    state.unassign(light_date);
    state.assign(light_holding.participant, heavy_date, moved_kind(heavy_holding));
    state.assign(heavy_holding.participant, light_date, moved_kind(light_holding));
}

fn restore(state: &mut RosterState, heavy_date: NaiveDate, heavy_holding: Holding, light_date: NaiveDate, light_holding: Holding) {
    state.unassign(heavy_date);
    state.unassign(light_date);
    state.assign(heavy_holding.participant, heavy_date, heavy_holding.kind);
    state.assign(light_holding.participant, light_date, light_holding.kind);
}
