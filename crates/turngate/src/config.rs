//! Harness configuration, loaded once at startup.
//!
//! A missing file is not an error at the call site that chooses to fall
//! back to defaults; a present-but-broken file always is.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// How many workers to run and how long they dwell in their sections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Reader threads to spawn.
    pub readers: u32,
    /// Writer threads to spawn.
    pub writers: u32,
    /// Sections each reader completes before retiring.
    pub rounds: u32,
    /// Microseconds a reader dwells inside its read section.
    pub reader_hold_us: u64,
    /// Microseconds a writer dwells inside its write section.
    pub writer_hold_us: u64,
    /// Bounded capacity of the access event bus.
    pub event_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            readers: 5,
            writers: 1,
            rounds: 20,
            reader_hold_us: 200,
            writer_hold_us: 500,
            event_capacity: 1024,
        }
    }
}

impl HarnessConfig {
    /// Loads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// describes an unrunnable pool.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects pools that cannot make progress.
    ///
    /// The turn-based policy needs at least one worker of each role: with
    /// no writers a drained read generation parks the turn on the writers'
    /// side forever, and with no readers the turn never leaves `Read`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.readers == 0 {
            return Err(HarnessError::InvalidConfig(
                "readers must be at least 1".to_string(),
            ));
        }
        if self.writers == 0 {
            return Err(HarnessError::InvalidConfig(
                "writers must be at least 1".to_string(),
            ));
        }
        if self.rounds == 0 {
            return Err(HarnessError::InvalidConfig(
                "rounds must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(HarnessError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
