// ==========================================
// Duty roster engine scenario tests
// ==========================================
// Covers: coverage, availability, no-consecutive duty, balance bounds,
// rebalancing, audit repeatability, empty rosters, config validation
// ==========================================

use std::io::Write;

use chrono::NaiveDate;
use duty_roster::schedule::audit::audit;
use duty_roster::schedule::{days_between, Advisory, AssignmentKind, CalendarDay, RosterState};
use duty_roster::{ConfigError, DutyRosterEngine, EngineConfig, Participant, RosterError, RunOutcome};

// ==========================================
// Helpers
// ==========================================

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

/// Sunday 2024-01-07 to Saturday 2024-01-13
fn reference_week(config: &EngineConfig) -> Vec<CalendarDay> {
    days_between(date(7), date(13), config).unwrap()
}

fn engine_with(config: EngineConfig) -> DutyRosterEngine {
    DutyRosterEngine::new(config).unwrap()
}

fn two_free() -> Vec<Participant> {
    vec![Participant::new("a", "Ayse"), Participant::new("b", "Baris")]
}

/// c can only take Wednesday the 10th
fn two_free_one_mostly_away() -> Vec<Participant> {
    let away: Vec<NaiveDate> = [7, 8, 9, 11, 12, 13].into_iter().map(date).collect();
    vec![
        Participant::new("a", "Ayse"),
        Participant::new("b", "Baris"),
        Participant::new("c", "Cem").with_unavailable(away),
    ]
}

fn participant<'o>(outcome: &'o RunOutcome, id: &str) -> &'o Participant {
    outcome.participants.iter().find(|p| p.id == id).unwrap()
}

fn weight_gap(outcome: &RunOutcome, config: &EngineConfig) -> f64 {
    let weights: Vec<f64> = outcome.participants.iter().map(|p| p.duty_weight(config)).collect();
    let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

fn assert_hard_rules_hold(outcome: &RunOutcome, days: usize) {
    let schedule = &outcome.schedule;
    assert_eq!(schedule.len(), days);

    for a in &schedule.assignments {
        match &a.participant_id {
            Some(id) => {
                let p = participant(outcome, id);
                assert!(p.is_available(a.date), "{} holds {} while unavailable", id, a.date);
                assert!(p.holds(a.date));
                assert_ne!(a.kind, AssignmentKind::Unassigned);
            }
            None => assert_eq!(a.kind, AssignmentKind::Unassigned),
        }
    }

    for p in &outcome.participants {
        for pair in p.assigned_dates.windows(2) {
            assert!(
                (pair[1] - pair[0]).num_days() > 1,
                "{} holds consecutive days {} and {}",
                p.id,
                pair[0],
                pair[1]
            );
        }
    }
}

// ==========================================
// Reference scenarios
// ==========================================

#[test]
fn two_free_participants_share_the_week_evenly() {
    duty_roster::logging::init_test();
    let engine = engine_with(EngineConfig::default());
    let outcome = engine.run(two_free(), reference_week(engine.config()));
    assert_hard_rules_hold(&outcome, 7);

    for p in &outcome.participants {
        assert!((3..=4).contains(&p.duty_count()), "{} has {} days", p.id, p.duty_count());
    }
    assert!(weight_gap(&outcome, engine.config()) <= 1.0);

    // Monday is boxed in by both participants' Sunday and Tuesday. Covering it would force
    // strict alternation (a on 7, 9, 11, 13 at 5.25 against b at 3.25), which breaks the
    // weight tolerance, so hard mode leaves it open.
    assert_eq!(outcome.schedule.unassigned_dates(), vec![date(8)]);
    assert_eq!(outcome.schedule.dates_of_kind(AssignmentKind::Forced), vec![date(11)]);
    assert!(outcome
        .advisories
        .contains(&Advisory::UncoveredDays { dates: vec![date(8)] }));
}

#[test]
fn mostly_unavailable_participant_gets_at_most_one_day() {
    let engine = engine_with(EngineConfig::default());
    let outcome = engine.run(two_free_one_mostly_away(), reference_week(engine.config()));
    assert_hard_rules_hold(&outcome, 7);

    let cem = participant(&outcome, "c");
    assert!(cem.duty_count() <= 1);
    assert_eq!(cem.assigned_dates, vec![date(10)]);
    assert_eq!(outcome.schedule.dates_for("c"), vec![date(10)]);

    let a = participant(&outcome, "a").duty_count() as f64;
    let b = participant(&outcome, "b").duty_count() as f64;
    assert!((a - b).abs() <= engine.config().count_tolerance);

    // Friday is covered by moving Thursday from a to b
    assert!(outcome.schedule.unassigned_dates().is_empty());
    assert_eq!(participant(&outcome, "a").assigned_dates, vec![date(7), date(9), date(12)]);
    assert_eq!(participant(&outcome, "b").assigned_dates, vec![date(8), date(11), date(13)]);
    assert_eq!(
        outcome.schedule.dates_of_kind(AssignmentKind::Forced),
        vec![date(9), date(11), date(12)]
    );
    assert!(outcome.advisories.contains(&Advisory::ForcedAssignments {
        dates: vec![date(9), date(11), date(12)]
    }));

    // no participant could have absorbed more, so no imbalance advisory
    assert!(!outcome
        .advisories
        .iter()
        .any(|adv| matches!(adv, Advisory::Imbalance { .. })));
}

// ==========================================
// Properties
// ==========================================

#[test]
fn balance_bound_without_hard_mode() {
    let config = EngineConfig {
        hard_mode_fallback: false,
        ..EngineConfig::default()
    };
    let engine = engine_with(config);

    for people in [two_free(), two_free_one_mostly_away()] {
        let outcome = engine.run(people, reference_week(engine.config()));
        assert_hard_rules_hold(&outcome, 7);
        assert!(outcome.schedule.dates_of_kind(AssignmentKind::Forced).is_empty());

        let counts: Vec<usize> = outcome.participants.iter().map(|p| p.duty_count()).collect();
        let max = *counts.iter().max().unwrap() as f64;
        let min = *counts.iter().min().unwrap() as f64;
        assert!(max - min <= engine.config().count_tolerance + 1.0, "counts {:?}", counts);
    }
}

#[test]
fn hard_rules_hold_over_a_longer_period() {
    let engine = engine_with(EngineConfig::default());
    let days = days_between(date(1), date(28), engine.config()).unwrap();
    let people = vec![
        Participant::new("a", "Ayse").with_unavailable([date(3), date(4), date(20)]),
        Participant::new("b", "Baris"),
        Participant::new("c", "Cem").with_unavailable((10..=16).map(date)),
        Participant::new("d", "Deniz").with_unavailable([date(1), date(27), date(28)]),
    ];

    let outcome = engine.run(people, days);
    assert_hard_rules_hold(&outcome, 28);
    let held: usize = outcome.participants.iter().map(|p| p.duty_count()).sum();
    assert_eq!(held + outcome.schedule.unassigned_dates().len(), 28);
}

#[test]
fn rebalancing_never_widens_the_gap() {
    let engine = engine_with(EngineConfig::default());
    let days = days_between(date(1), date(21), engine.config()).unwrap();
    let people = vec![
        Participant::new("a", "Ayse"),
        Participant::new("b", "Baris").with_unavailable([date(6), date(13)]),
        Participant::new("c", "Cem"),
    ];

    let mut outcome = engine.run(people, days);
    for _ in 0..3 {
        let before = weight_gap(&outcome, engine.config());
        let next = engine.rebalance(outcome.clone());
        let after = weight_gap(&next, engine.config());
        match &next.swap {
            Some(_) => assert!(after < before),
            None => assert_eq!(next.schedule, outcome.schedule),
        }
        assert_hard_rules_hold(&next, 21);
        outcome = next;
    }
}

#[test]
fn audit_is_repeatable() {
    let engine = engine_with(EngineConfig::default());
    let days = reference_week(engine.config());
    let outcome = engine.run(two_free(), days.clone());

    let state = RosterState::from_partial(outcome.participants.clone(), days, engine.config());
    let first = audit(&state, engine.config());
    let second = audit(&state, engine.config());
    assert_eq!(first, second);
    assert!(first.contains(&Advisory::UncoveredDays { dates: vec![date(8)] }));
}

#[test]
fn repair_keeps_existing_duties() {
    let engine = engine_with(EngineConfig::default());
    let first = engine.run(two_free(), reference_week(engine.config()));
    let second = engine.repair(first.participants.clone(), reference_week(engine.config()));

    for p in &first.participants {
        assert_eq!(participant(&second, &p.id).assigned_dates, p.assigned_dates);
    }
    assert_eq!(second.schedule.unassigned_dates(), vec![date(8)]);
}

// ==========================================
// Edge cases
// ==========================================

#[test]
fn empty_roster_gives_empty_schedule() {
    let engine = engine_with(EngineConfig::default());

    let no_people = engine.run(vec![], reference_week(engine.config()));
    assert!(no_people.schedule.is_empty());
    assert!(no_people.swap.is_none());

    let no_days = engine.run(two_free(), vec![]);
    assert!(no_days.schedule.is_empty());
    assert!(no_days.advisories.is_empty());
}

#[test]
fn duplicate_ids_keep_the_later_record() {
    let engine = engine_with(EngineConfig::default());
    let people = vec![
        Participant::new("a", "Ayse"),
        Participant::new("b", "Baris"),
        Participant::new("a", "Ayse K.").with_unavailable([date(13)]),
    ];
    let outcome = engine.run(people, reference_week(engine.config()));

    assert_eq!(outcome.participants.len(), 2);
    assert_eq!(participant(&outcome, "a").name, "Ayse K.");
    assert_ne!(
        outcome.schedule.get(date(13)).and_then(|a| a.participant_id.as_deref()),
        Some("a")
    );
}

#[test]
fn inconsistent_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "weekday_weights": [1, 1, 1, 1, 1, 1] }}"#).unwrap();
    file.flush().unwrap();
    let err = EngineConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, RosterError::Config(ConfigError::WeightTableLength(6))));

    let config = EngineConfig {
        count_tolerance: -1.0,
        ..EngineConfig::default()
    };
    assert!(matches!(
        DutyRosterEngine::new(config),
        Err(RosterError::Config(ConfigError::InvalidTolerance { name: "count_tolerance", .. }))
    ));
}

#[test]
fn partial_config_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "backfill_cycles": 2, "hard_mode_fallback": false }}"#).unwrap();
    file.flush().unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.backfill_cycles, 2);
    assert!(!config.hard_mode_fallback);
    assert_eq!(config.weekday_weights, EngineConfig::default().weekday_weights);
}
