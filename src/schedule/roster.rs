use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use super::calendar::total_weight;
use super::types::{Assignment, AssignmentKind, CalendarDay, Participant, Schedule};

/// Who holds a day and how they got it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holding {
    pub participant: usize,
    pub kind: AssignmentKind,
}

/// Mutable working state handed from phase to phase.
///
/// Participants are addressed by their index in `participants`; each participant's
/// `assigned_dates` and the `holders` map are always updated together.
#[derive(Debug, Clone)]
pub struct RosterState {
    days: Vec<CalendarDay>,
    participants: Vec<Participant>,
    holders: BTreeMap<NaiveDate, Holding>,
}

impl RosterState {
    /// Fresh state: prior assignments are discarded
    pub fn new(participants: Vec<Participant>, days: Vec<CalendarDay>, config: &EngineConfig) -> Self {
        let mut participants = merge_duplicates(participants);
        for p in &mut participants {
            p.assigned_dates.clear();
        }

        Self {
            days: normalize_days(days, config),
            participants,
            holders: BTreeMap::new(),
        }
    }

    /// State seeded from existing assignments, keeping only those that are still valid
    pub fn from_partial(participants: Vec<Participant>, days: Vec<CalendarDay>, config: &EngineConfig) -> Self {
        let mut participants = merge_duplicates(participants);
        let previous: Vec<Vec<NaiveDate>> = participants
            .iter_mut()
            .map(|p| std::mem::take(&mut p.assigned_dates))
            .collect();

        let mut state = Self {
            days: normalize_days(days, config),
            participants,
            holders: BTreeMap::new(),
        };

        for (idx, dates) in previous.into_iter().enumerate() {
            for date in dates {
                let keep = state.day(date).is_some()
                    && state.participants[idx].is_available(date)
                    && state.holder(date).is_none()
                    && !state.holds_neighbour(idx, date);
                if keep {
                    state.assign(idx, date, AssignmentKind::Retained);
                } else {
                    debug!(
                        participant = %state.participants[idx].id,
                        %date,
                        "dropping stale assignment"
                    );
                }
            }
        }
        state
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, idx: usize) -> &Participant {
        &self.participants[idx]
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty() || self.participants.is_empty()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|i| &self.days[i])
    }

    pub fn holder(&self, date: NaiveDate) -> Option<usize> {
        self.holders.get(&date).map(|h| h.participant)
    }

    pub fn holding(&self, date: NaiveDate) -> Option<Holding> {
        self.holders.get(&date).copied()
    }

    pub fn holds(&self, idx: usize, date: NaiveDate) -> bool {
        self.holder(date) == Some(idx)
    }

    /// Whether the participant holds the calendar day before or after `date`
    pub fn holds_neighbour(&self, idx: usize, date: NaiveDate) -> bool {
        let before = date.checked_sub_days(Days::new(1));
        let after = date.checked_add_days(Days::new(1));
        [before, after]
            .into_iter()
            .flatten()
            .any(|d| self.holds(idx, d))
    }

    pub fn assign(&mut self, idx: usize, date: NaiveDate, kind: AssignmentKind) {
        if let Some(previous) = self.holders.insert(date, Holding { participant: idx, kind }) {
            if previous.participant != idx {
                self.participants[previous.participant].remove_duty(date);
            }
        }
        self.participants[idx].add_duty(date);
    }

    pub fn unassign(&mut self, date: NaiveDate) -> Option<Holding> {
        let holding = self.holders.remove(&date)?;
        self.participants[holding.participant].remove_duty(date);
        Some(holding)
    }

    /// Days with no holder, in date order
    pub fn unassigned_days(&self) -> Vec<&CalendarDay> {
        self.days
            .iter()
            .filter(|d| !self.holders.contains_key(&d.date))
            .collect()
    }

    pub fn duty_count(&self, idx: usize) -> usize {
        self.participants[idx].duty_count()
    }

    pub fn duty_weight(&self, idx: usize, config: &EngineConfig) -> f64 {
        self.participants[idx].duty_weight(config)
    }

    /// Unavailable dates that fall inside the period
    pub fn unavailable_in_period(&self, idx: usize) -> usize {
        let p = &self.participants[idx];
        self.days
            .iter()
            .filter(|d| !p.is_available(d.date))
            .count()
    }

    pub fn average_duty_count(&self) -> f64 {
        if self.participants.is_empty() {
            return 0.0;
        }
        self.days.len() as f64 / self.participants.len() as f64
    }

    pub fn average_duty_weight(&self) -> f64 {
        if self.participants.is_empty() {
            return 0.0;
        }
        total_weight(&self.days) / self.participants.len() as f64
    }

    /// Max minus min duty weight across the roster
    pub fn weight_gap(&self, config: &EngineConfig) -> f64 {
        let weights: Vec<f64> = (0..self.participants.len())
            .map(|i| self.duty_weight(i, config))
            .collect();
        let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
        if weights.is_empty() {
            0.0
        } else {
            max - min
        }
    }

    /// Snapshot of the current assignments as a schedule
    pub fn to_schedule(&self) -> Schedule {
        let assignments = self
            .days
            .iter()
            .map(|day| match self.holders.get(&day.date) {
                Some(holding) => {
                    let p = &self.participants[holding.participant];
                    Assignment {
                        date: day.date,
                        weekday: day.weekday,
                        weight: day.weight,
                        participant_id: Some(p.id.clone()),
                        participant_name: Some(p.name.clone()),
                        kind: holding.kind,
                    }
                }
                None => Assignment {
                    date: day.date,
                    weekday: day.weekday,
                    weight: day.weight,
                    participant_id: None,
                    participant_name: None,
                    kind: AssignmentKind::Unassigned,
                },
            })
            .collect();
        Schedule { assignments }
    }

    pub fn into_parts(self) -> (Vec<Participant>, Vec<CalendarDay>) {
        (self.participants, self.days)
    }
}

/// Keeps the last record for each participant id, preserving first-seen order
fn merge_duplicates(participants: Vec<Participant>) -> Vec<Participant> {
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Participant> = Vec::with_capacity(participants.len());

    for p in participants {
        if let Some(&existing) = index_by_id.get(&p.id) {
            warn!(participant = %p.id, "duplicate participant id, keeping the later record");
            merged[existing] = p;
        } else {
            index_by_id.insert(p.id.clone(), merged.len());
            merged.push(p);
        }
    }
    merged
}

/// Sorts, de-duplicates and re-weights the days from the config's weight table
fn normalize_days(days: Vec<CalendarDay>, config: &EngineConfig) -> Vec<CalendarDay> {
    let mut dates: Vec<NaiveDate> = days.into_iter().map(|d| d.date).collect();
    dates.sort();
    dates.dedup();
    dates.into_iter().map(|d| CalendarDay::new(d, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::calendar::days_between;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn week(config: &EngineConfig) -> Vec<CalendarDay> {
        days_between(date(7), date(13), config).unwrap()
    }

    #[test]
    fn new_state_discards_prior_assignments_and_merges_ids() {
        let config = EngineConfig::default();
        let mut a = Participant::new("a", "Ayse");
        a.assigned_dates = vec![date(7)];
        let a2 = Participant::new("a", "Ayse K.");
        let b = Participant::new("b", "Baris");

        let state = RosterState::new(vec![a, b, a2], week(&config), &config);
        assert_eq!(state.participant_count(), 2);
        assert_eq!(state.participant(0).name, "Ayse K.");
        assert_eq!(state.duty_count(0), 0);
        assert_eq!(state.average_duty_count(), 3.5);
        assert_eq!(state.average_duty_weight(), 4.25);
    }

    #[test]
    fn assign_keeps_both_views_in_sync() {
        let config = EngineConfig::default();
        let people = vec![Participant::new("a", "Ayse"), Participant::new("b", "Baris")];
        let mut state = RosterState::new(people, week(&config), &config);

        state.assign(0, date(9), AssignmentKind::Primary);
        assert!(state.holds(0, date(9)));
        assert!(state.holds_neighbour(0, date(8)));
        assert!(state.holds_neighbour(0, date(10)));
        assert!(!state.holds_neighbour(0, date(11)));

        // reassigning moves the duty off the previous holder
        state.assign(1, date(9), AssignmentKind::Forced);
        assert_eq!(state.duty_count(0), 0);
        assert_eq!(state.duty_count(1), 1);
        assert_eq!(state.holding(date(9)).map(|h| h.kind), Some(AssignmentKind::Forced));

        assert_eq!(state.unassign(date(9)).map(|h| h.participant), Some(1));
        assert_eq!(state.unassigned_days().len(), 7);
    }

    #[test]
    fn partial_state_drops_invalid_assignments() {
        let config = EngineConfig::default();
        let mut a = Participant::new("a", "Ayse").with_unavailable([date(11)]);
        a.assigned_dates = vec![date(7), date(8), date(11), date(20)];
        let mut b = Participant::new("b", "Baris");
        b.assigned_dates = vec![date(7), date(10)];

        let state = RosterState::from_partial(vec![a, b], week(&config), &config);
        // 8 follows 7, 11 is unavailable, 20 is outside the period
        assert_eq!(state.participant(0).assigned_dates, vec![date(7)]);
        // 7 is already taken by a
        assert_eq!(state.participant(1).assigned_dates, vec![date(10)]);
        assert_eq!(state.holding(date(10)).map(|h| h.kind), Some(AssignmentKind::Retained));
    }

    #[test]
    fn schedule_snapshot_covers_every_day() {
        let config = EngineConfig::default();
        let people = vec![Participant::new("a", "Ayse")];
        let mut state = RosterState::new(people, week(&config), &config);
        state.assign(0, date(13), AssignmentKind::Primary);

        let schedule = state.to_schedule();
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule.unassigned_dates().len(), 6);
        assert_eq!(schedule.get(date(13)).and_then(|a| a.participant_name.as_deref()), Some("Ayse"));
        assert_eq!(state.weight_gap(&config), 0.0);
    }
}
