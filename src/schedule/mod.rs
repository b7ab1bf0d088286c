pub mod types;
pub mod calendar;
pub mod roster;
pub mod constraints;
pub mod priority;
pub mod greedy;
pub mod backfill;
pub mod rebalance;
pub mod audit;
pub mod engine;

pub use types::{Assignment, AssignmentKind, CalendarDay, Participant, ParticipantId, Schedule, Swap};
pub use calendar::{days_between, days_from_dates, format_date_label, parse_date};
pub use roster::RosterState;
pub use constraints::{Constraint, ConstraintEvaluator};
pub use audit::{audit, Advisory};
pub use engine::{DutyRosterEngine, RunOutcome};
