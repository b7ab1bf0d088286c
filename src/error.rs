use thiserror::Error;

/// Configuration problems caught before any assignment is attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weekday weight table must have 7 entries (Sunday first), got {0}")]
    WeightTableLength(usize),

    #[error("weekday weight for day {weekday} must be a finite, non-negative number, got {value}")]
    InvalidWeight { weekday: usize, value: f64 },

    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("{field} contains weekday {weekday}, expected 0 (Sunday) to 6 (Saturday)")]
    WeekdayOutOfRange { field: &'static str, weekday: u8 },

    #[error("day priority must list every weekday exactly once, got {0:?}")]
    DayPriorityNotPermutation(Vec<u8>),

    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Crate-level error type
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("invalid roster period: {0}")]
    InvalidPeriod(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RosterError>;
