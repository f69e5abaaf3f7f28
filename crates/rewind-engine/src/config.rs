//! Engine configuration.
//!
//! One JSON document configures the tick rate, the history encoding and the
//! movement tuning. Every field has a default, so a partial document (or an
//! empty `{}`) is valid:
//!
//! ```
//! use rewind_engine::config::EngineConfig;
//!
//! let cfg = EngineConfig::from_json_str(r#"{ "rewind": { "keyframe_period": 60 } }"#).unwrap();
//! assert_eq!(cfg.rewind.keyframe_period, 60);
//! assert_eq!(cfg.tick.fixed_dt, 1.0 / 60.0);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use rewind_history::rewinder::RewindConfig;

use crate::movement::MovementConfig;
use crate::tick::TickConfig;
use crate::EngineError;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick rate.
    pub tick: TickConfig,
    /// History encoding.
    pub rewind: RewindConfig,
    /// Movement tuning.
    pub movement: MovementConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// [`EngineError::Json`] for malformed JSON, or the validation error of
    /// an out-of-range value.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            fixed_dt = config.tick.fixed_dt,
            keyframe_period = config.rewind.keyframe_period,
            "loaded engine config"
        );
        Ok(config)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`EngineError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// The first validation error found.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.tick.validate()?;
        self.rewind.validate()?;
        self.movement.validate()?;
        Ok(())
    }
}
