use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use super::audit::{audit, Advisory};
use super::backfill::{run_backfill, BackfillMode};
use super::greedy::run_primary_pass;
use super::rebalance::rebalance_once;
use super::roster::RosterState;
use super::types::{CalendarDay, Participant, Schedule, Swap};

/// Everything a run hands back to its caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub schedule: Schedule,
    /// Participant records with their updated assigned dates
    pub participants: Vec<Participant>,
    pub advisories: Vec<Advisory>,
    pub swap: Option<Swap>,
}

impl RunOutcome {
    pub fn advisory_messages(&self) -> Vec<String> {
        self.advisories.iter().map(|a| a.to_string()).collect()
    }
}

/// Entry point to the assignment engine
#[derive(Debug, Clone)]
pub struct DutyRosterEngine {
    config: EngineConfig,
}

impl DutyRosterEngine {
    /// Validates the config up front so no run can start from an inconsistent policy
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds a schedule from scratch; prior assigned dates are ignored
    pub fn run(&self, participants: Vec<Participant>, days: Vec<CalendarDay>) -> RunOutcome {
        let state = RosterState::new(participants, days, &self.config);
        self.execute(state, "run")
    }

    /// Keeps still-valid assigned dates and fills around them
    pub fn repair(&self, participants: Vec<Participant>, days: Vec<CalendarDay>) -> RunOutcome {
        let state = RosterState::from_partial(participants, days, &self.config);
        self.execute(state, "repair")
    }

    /// One more rebalancing step on a previous outcome, followed by a fresh audit
    pub fn rebalance(&self, outcome: RunOutcome) -> RunOutcome {
        let days: Vec<CalendarDay> = outcome
            .schedule
            .assignments
            .iter()
            .map(|a| CalendarDay::new(a.date, &self.config))
            .collect();
        let mut state = RosterState::from_partial(outcome.participants, days, &self.config);
        // carry the phase tags over from the previous schedule
        for a in &outcome.schedule.assignments {
            if let Some(holder) = state.holder(a.date) {
                state.assign(holder, a.date, a.kind);
            }
        }

        let (state, swap) = rebalance_once(state, &self.config);
        self.finish(state, swap)
    }

    fn execute(&self, state: RosterState, label: &str) -> RunOutcome {
        if state.is_empty() {
            info!(
                participants = state.participant_count(),
                days = state.days().len(),
                "empty roster, nothing to assign"
            );
            let (participants, _) = state.into_parts();
            return RunOutcome {
                participants,
                ..RunOutcome::default()
            };
        }

        let (state, primary) = run_primary_pass(state, &self.config);

        let (mut state, relaxed) = run_backfill(
            state,
            &self.config,
            BackfillMode::Relaxed,
            self.config.backfill_cycles,
        );

        if !relaxed.fully_covered() && self.config.hard_mode_fallback {
            let (next, hard) = run_backfill(
                state,
                &self.config,
                BackfillMode::Hard,
                self.config.backfill_cycles.max(1),
            );
            state = next;
            if !hard.placed.is_empty() {
                warn!(
                    days = hard.placed.len(),
                    relocated = hard.relocated.len(),
                    "hard mode assigned days without fairness rules"
                );
            }
        }

        let (state, swap) = rebalance_once(state, &self.config);
        let outcome = self.finish(state, swap);

        info!(
            mode = label,
            days = outcome.schedule.len(),
            primary = primary.assigned,
            backfilled = relaxed.placed.len(),
            unassigned = outcome.schedule.unassigned_dates().len(),
            swapped = outcome.swap.is_some(),
            advisories = outcome.advisories.len(),
            "schedule built"
        );
        outcome
    }

    fn finish(&self, state: RosterState, swap: Option<Swap>) -> RunOutcome {
        let advisories = audit(&state, &self.config);
        let schedule = state.to_schedule();
        let (participants, _) = state.into_parts();
        RunOutcome {
            schedule,
            participants,
            advisories,
            swap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RosterError};
    use crate::schedule::calendar::days_between;
    use crate::schedule::types::AssignmentKind;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn week(config: &EngineConfig) -> Vec<CalendarDay> {
        days_between(date(7), date(13), config).unwrap()
    }

    #[test]
    fn inconsistent_config_fails_before_any_run() {
        let config = EngineConfig {
            weekday_weights: vec![1.0; 5],
            ..EngineConfig::default()
        };
        assert!(matches!(
            DutyRosterEngine::new(config),
            Err(RosterError::Config(ConfigError::WeightTableLength(5)))
        ));
    }

    #[test]
    fn empty_roster_returns_empty_schedule() {
        crate::logging::init_test();
        let engine = DutyRosterEngine::new(EngineConfig::default()).unwrap();
        let outcome = engine.run(vec![], week(engine.config()));
        assert!(outcome.schedule.is_empty());
        assert!(outcome.advisories.is_empty());

        let outcome = engine.run(vec![Participant::new("a", "Ayse")], vec![]);
        assert!(outcome.schedule.is_empty());
        assert_eq!(outcome.participants.len(), 1);
    }

    #[test]
    fn hard_mode_fallback_can_be_switched_off() {
        let config = EngineConfig {
            hard_mode_fallback: false,
            ..EngineConfig::default()
        };
        let engine = DutyRosterEngine::new(config).unwrap();
        let people = vec![Participant::new("a", "Ayse"), Participant::new("b", "Baris")];
        let outcome = engine.run(people, week(engine.config()));

        assert!(outcome.schedule.dates_of_kind(AssignmentKind::Forced).is_empty());
        assert_eq!(outcome.schedule.unassigned_dates(), vec![date(8), date(11)]);
    }

    #[test]
    fn repair_keeps_valid_assignments() {
        let engine = DutyRosterEngine::new(EngineConfig::default()).unwrap();
        let mut a = Participant::new("a", "Ayse");
        a.assigned_dates = vec![date(13)];
        let outcome = engine.repair(vec![a, Participant::new("b", "Baris")], week(engine.config()));

        let saturday = outcome.schedule.get(date(13)).unwrap();
        assert_eq!(saturday.participant_id.as_deref(), Some("a"));
        assert_eq!(saturday.kind, AssignmentKind::Retained);
        // Friday sits between b's Thursday and a's Saturday
        assert_eq!(outcome.schedule.unassigned_dates(), vec![date(12)]);
    }

    #[test]
    fn rebalance_on_outcome_never_widens_the_gap() {
        let engine = DutyRosterEngine::new(EngineConfig::default()).unwrap();
        let days = days_between(date(7), date(20), engine.config()).unwrap();
        let people = vec![
            Participant::new("a", "Ayse"),
            Participant::new("b", "Baris"),
            Participant::new("c", "Cem"),
        ];
        let outcome = engine.run(people, days);
        let gap = |o: &RunOutcome| {
            let w: Vec<f64> = o.participants.iter().map(|p| p.duty_weight(engine.config())).collect();
            w.iter().copied().fold(f64::NEG_INFINITY, f64::max) - w.iter().copied().fold(f64::INFINITY, f64::min)
        };

        let before = gap(&outcome);
        let kinds_before: Vec<AssignmentKind> = outcome.schedule.assignments.iter().map(|a| a.kind).collect();
        let next = engine.rebalance(outcome.clone());
        assert!(gap(&next) <= before);
        if next.swap.is_none() {
            assert_eq!(next.schedule, outcome.schedule);
            let kinds_after: Vec<AssignmentKind> = next.schedule.assignments.iter().map(|a| a.kind).collect();
            assert_eq!(kinds_after, kinds_before);
        }
    }
}
