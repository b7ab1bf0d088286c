use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const SUNDAY: u8 = 0;
pub const MONDAY: u8 = 1;
pub const TUESDAY: u8 = 2;
pub const WEDNESDAY: u8 = 3;
pub const THURSDAY: u8 = 4;
pub const FRIDAY: u8 = 5;
pub const SATURDAY: u8 = 6;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "DUTY_ROSTER_CONFIG";

/// Tunable policy for the assignment engine.
///
/// Every field has a default, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Relative shift burden per weekday, Sunday first
    pub weekday_weights: Vec<f64>,
    pub count_tolerance: f64,
    pub weight_tolerance: f64,
    pub backfill_cycles: u32,
    /// Run the availability + no-consecutive sweep when relaxed cycles leave days uncovered
    pub hard_mode_fallback: bool,
    /// Weekdays a participant may hold at most once per period
    pub peak_weekdays: Vec<u8>,
    pub thursday_weekend_linkage: bool,
    /// Order in which weekdays are filled by the greedy pass
    pub day_priority: Vec<u8>,
    pub audit_weight_gap: f64,
    pub audit_count_gap: u32,
    /// Seeds generated ids and export colours, never the assignment logic
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weekday_weights: vec![1.5, 1.0, 1.0, 1.0, 0.75, 1.25, 2.0],
            count_tolerance: 1.0,
            weight_tolerance: 0.75,
            backfill_cycles: 5,
            hard_mode_fallback: true,
            peak_weekdays: vec![THURSDAY, FRIDAY, SATURDAY, SUNDAY],
            thursday_weekend_linkage: true,
            day_priority: vec![SATURDAY, THURSDAY, SUNDAY, FRIDAY, MONDAY, TUESDAY, WEDNESDAY],
            audit_weight_gap: 2.0,
            audit_count_gap: 2,
            seed: 42,
        }
    }
}

impl EngineConfig {
    /// Loads a config file, falling back to defaults for missing keys
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "loaded engine config");
        Ok(config)
    }

    /// Uses the file named by `DUTY_ROSTER_CONFIG` if set, defaults otherwise
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Checks the config is internally consistent
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.weekday_weights.len() != 7 {
            return Err(ConfigError::WeightTableLength(self.weekday_weights.len()));
        }
        for (weekday, &value) in self.weekday_weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { weekday, value });
            }
        }

        for (name, value) in [
            ("count_tolerance", self.count_tolerance),
            ("weight_tolerance", self.weight_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }

        if !self.audit_weight_gap.is_finite() || self.audit_weight_gap < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "audit_weight_gap",
                value: self.audit_weight_gap,
            });
        }

        if let Some(&weekday) = self.peak_weekdays.iter().find(|&&d| d > SATURDAY) {
            return Err(ConfigError::WeekdayOutOfRange { field: "peak_weekdays", weekday });
        }
        if let Some(&weekday) = self.day_priority.iter().find(|&&d| d > SATURDAY) {
            return Err(ConfigError::WeekdayOutOfRange { field: "day_priority", weekday });
        }

        let mut seen = [false; 7];
        for &d in &self.day_priority {
            seen[d as usize] = true;
        }
        if self.day_priority.len() != 7 || seen.iter().any(|s| !s) {
            return Err(ConfigError::DayPriorityNotPermutation(self.day_priority.clone()));
        }

        Ok(())
    }

    /// Weight of a weekday (0 = Sunday). Only meaningful on a validated config.
    pub fn weight_of(&self, weekday: u8) -> f64 {
        self.weekday_weights
            .get(weekday as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_peak(&self, weekday: u8) -> bool {
        self.peak_weekdays.contains(&weekday)
    }

    /// Position of a weekday in the fill order, lower goes first
    pub fn day_rank(&self, weekday: u8) -> usize {
        self.day_priority
            .iter()
            .position(|&d| d == weekday)
            .unwrap_or(self.day_priority.len())
    }
}
