//! JSON file persistence for a roster, so the HTTP mode survives restarts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::parser::{parse_roster, Roster};

pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the roster, assigned dates included
    pub fn save(&self, roster: &Roster) -> Result<()> {
        let json = serde_json::to_string_pretty(roster)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), participants = roster.participants.len(), "roster saved");
        Ok(())
    }

    /// `None` when nothing has been stored yet
    pub fn load(&self, config: &EngineConfig) -> Result<Option<Roster>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(parse_roster(&json, config)?))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
