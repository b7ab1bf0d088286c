use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use super::constraints::{Constraint, ConstraintEvaluator, BACKFILL_RULES, HARD_MODE_RULES};
use super::priority::{order_for_backfill, order_unassigned_days};
use super::roster::{Holding, RosterState};
use super::types::{AssignmentKind, CalendarDay};

/// Which rule set a repair cycle applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillMode {
    /// Availability, no-consecutive, count balance and the weekday policies
    Relaxed,
    /// Availability and no-consecutive only; placements are tagged as forced
    Hard,
}

impl BackfillMode {
    fn rules(&self) -> &'static [Constraint] {
        match self {
            BackfillMode::Relaxed => BACKFILL_RULES,
            BackfillMode::Hard => HARD_MODE_RULES,
        }
    }

    fn kind(&self) -> AssignmentKind {
        match self {
            BackfillMode::Relaxed => AssignmentKind::Backfill,
            BackfillMode::Hard => AssignmentKind::Forced,
        }
    }
}

/// Outcome of a run of repair cycles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillReport {
    pub cycles_run: u32,
    pub placed: Vec<NaiveDate>,
    /// Days handed to another participant so a blocked neighbour could be covered
    pub relocated: Vec<NaiveDate>,
    pub still_unassigned: Vec<NaiveDate>,
}

impl BackfillReport {
    pub fn fully_covered(&self) -> bool {
        self.still_unassigned.is_empty()
    }
}

/// Retries uncovered days for up to `max_cycles` cycles.
///
/// Each cycle re-sorts the uncovered days (heaviest first) and the participants
/// (lightest first) and gives every day to the first participant the mode's rules admit.
/// Constraints only tighten as duties accumulate, so a cycle that places nothing ends
/// the loop.
///
/// In hard mode a day nobody can take directly may still be covered by moving one
/// participant's neighbouring duty to someone else, see [`relocate_for`].
pub fn run_backfill(
    mut state: RosterState,
    config: &EngineConfig,
    mode: BackfillMode,
    max_cycles: u32,
) -> (RosterState, BackfillReport) {
    let mut report = BackfillReport::default();
    if state.is_empty() {
        return (state, report);
    }

    let evaluator = ConstraintEvaluator::new(&state, config);

    while report.cycles_run < max_cycles {
        let open: Vec<CalendarDay> = {
            let days = state.unassigned_days();
            order_unassigned_days(&days).into_iter().cloned().collect()
        };
        if open.is_empty() {
            break;
        }

        report.cycles_run += 1;
        let (placed, relocated) = run_cycle(&mut state, &evaluator, config, mode, &open);
        debug!(
            ?mode,
            cycle = report.cycles_run,
            open = open.len(),
            placed = placed.len(),
            relocated = relocated.len(),
            "backfill cycle finished"
        );

        let progressed = !placed.is_empty();
        report.placed.extend(placed);
        report.relocated.extend(relocated);
        if !progressed {
            break;
        }
    }

    report.placed.sort();
    report.relocated.sort();
    report.still_unassigned = state.unassigned_days().iter().map(|d| d.date).collect();
    if mode == BackfillMode::Hard && !report.still_unassigned.is_empty() {
        warn!(
            days = report.still_unassigned.len(),
            "no participant can take these days even with fairness rules dropped"
        );
    }
    (state, report)
}

fn run_cycle(
    state: &mut RosterState,
    evaluator: &ConstraintEvaluator<'_>,
    config: &EngineConfig,
    mode: BackfillMode,
    open: &[CalendarDay],
) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    let participants = order_for_backfill(state, config);
    let mut placed = Vec::new();
    let mut relocated = Vec::new();

    for day in open {
        let chosen = participants
            .iter()
            .copied()
            .find(|&p| evaluator.admits(state, p, day, mode.rules()));

        if let Some(p) = chosen {
            state.assign(p, day.date, mode.kind());
            placed.push(day.date);
        } else if mode == BackfillMode::Hard {
            if let Some(moved) = relocate_for(state, evaluator, config, &participants, day) {
                placed.push(day.date);
                relocated.extend(moved);
            }
        }
    }
    (placed, relocated)
}

/// Covers `day` by moving a blocking neighbour duty off a participant who could
/// otherwise take it.
///
/// Each neighbouring duty goes to the first other participant (in `order`) the hard
/// rules admit, then the freed participant takes `day`. Both sides of every move must
/// end within `weight_tolerance` of each other, otherwise all moves are undone and the
/// next participant is tried. Returns the dates that changed hands.
fn relocate_for(
    state: &mut RosterState,
    evaluator: &ConstraintEvaluator<'_>,
    config: &EngineConfig,
    order: &[usize],
    day: &CalendarDay,
) -> Option<Vec<NaiveDate>> {
    for &taker in order {
        if !state.participant(taker).is_available(day.date) || !state.holds_neighbour(taker, day.date) {
            continue;
        }
        let neighbours: Vec<NaiveDate> = [day.date.pred_opt(), day.date.succ_opt()]
            .into_iter()
            .flatten()
            .filter(|&d| state.holds(taker, d))
            .collect();

        let mut moved: Vec<(NaiveDate, Holding)> = Vec::new();
        let mut receivers = Vec::new();
        for date in &neighbours {
            let Some(neighbour) = state.day(*date).cloned() else {
                break;
            };
            let Some(previous) = state.unassign(*date) else {
                break;
            };
            moved.push((*date, previous));

            let receiver = order
                .iter()
                .copied()
                .find(|&r| r != taker && evaluator.admits(state, r, &neighbour, HARD_MODE_RULES));
            match receiver {
                Some(r) => {
                    state.assign(r, *date, AssignmentKind::Forced);
                    receivers.push(r);
                }
                None => break,
            }
        }

        if receivers.len() == neighbours.len() && evaluator.admits(state, taker, day, HARD_MODE_RULES) {
            state.assign(taker, day.date, AssignmentKind::Forced);
            let taker_weight = state.duty_weight(taker, config);
            let within = receivers
                .iter()
                .all(|&r| (taker_weight - state.duty_weight(r, config)).abs() <= config.weight_tolerance);
            if within {
                debug!(
                    date = %day.date,
                    participant = %state.participant(taker).id,
                    moved = ?neighbours,
                    "relocated a neighbouring duty"
                );
                return Some(neighbours);
            }
            state.unassign(day.date);
        }

        for (date, previous) in moved.into_iter().rev() {
            state.assign(previous.participant, date, previous.kind);
        }
    }
    None
}
