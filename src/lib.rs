//! Duty-roster assignment engine.
//!
//! Builds a fair one-holder-per-day schedule over a roster period: a greedy pass,
//! bounded repair cycles, an optional hard-mode fallback, a single-swap rebalancer
//! and a read-only fairness audit.

pub mod config;
pub mod error;
pub mod logging;
pub mod schedule;
pub mod parser;
pub mod storage;
pub mod export;
pub mod display;
pub mod web;

pub use config::EngineConfig;
pub use error::{ConfigError, Result, RosterError};
pub use parser::{load_participants_csv, load_roster, PeriodSpec, Roster};
pub use schedule::{
    Advisory, Assignment, AssignmentKind, CalendarDay, DutyRosterEngine, Participant, RunOutcome, Schedule,
};
