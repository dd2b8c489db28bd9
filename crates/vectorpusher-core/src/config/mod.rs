//! Sculpting configuration types.
//!
//! Every numeric knob of the pipeline lives here rather than in the
//! algorithms: the strength schedule endpoints, the divergence bound
//! `kappa`, the winsorization clip, per-branch strength multipliers and
//! the set of token ids that are never sculpted.
//!
//! # Example
//!
//! ```
//! use vectorpusher_core::config::SculptConfig;
//!
//! let config = SculptConfig::default();
//! assert!((config.blend.kappa - 0.03).abs() < 1e-9);
//! assert!(config.validate().is_ok());
//! ```

mod blend;
mod branch;
mod schedule;


use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SculptError, SculptResult};

pub use blend::{BlendConfig, ScaleFactor, SculptMode};
pub use branch::BranchConfig;
pub use schedule::{LinearRange, ScheduleConfig};

/// CLIP start-of-text, end-of-text and padding ids.
pub const CLIP_SPECIAL_TOKENS: [u32; 4] = [0, 2, 49406, 49407];

/// Top-level sculpting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SculptConfig {
    /// Stepping pipeline to run.
    #[serde(default)]
    pub mode: SculptMode,

    /// Multi-scale blend and robust weighting settings.
    #[serde(default)]
    pub blend: BlendConfig,

    /// Strength schedule endpoints.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Per-branch strength multipliers.
    #[serde(default)]
    pub branches: BranchConfig,

    /// Token ids passed through untouched.
    #[serde(default)]
    pub ignored_tokens: BTreeSet<u32>,

    /// Log per-token detail at debug level.
    #[serde(default)]
    pub debug: bool,
}

impl SculptConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus the CLIP special tokens in `ignored_tokens`.
    pub fn clip_defaults() -> Self {
        Self {
            ignored_tokens: CLIP_SPECIAL_TOKENS.iter().copied().collect(),
            ..Default::default()
        }
    }

    /// Replace the ignored token set.
    pub fn with_ignored_tokens(mut self, tokens: impl IntoIterator<Item = u32>) -> Self {
        self.ignored_tokens = tokens.into_iter().collect();
        self
    }

    /// Select the stepping pipeline.
    pub fn with_mode(mut self, mode: SculptMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether `token` is configured to be skipped.
    pub fn is_ignored(&self, token: u32) -> bool {
        self.ignored_tokens.contains(&token)
    }

    /// Validate the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.blend.validate()?;
        self.schedule.validate()?;
        self.branches.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    ///
    /// Missing sections fall back to their defaults.
    ///
    /// # Errors
    ///
    /// - `SculptError::SerializationError` for malformed JSON.
    /// - `SculptError::ConfigError` if validation fails.
    pub fn from_json_str(json: &str) -> SculptResult<Self> {
        let config: SculptConfig = serde_json::from_str(json)?;
        config.validate().map_err(SculptError::ConfigError)?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// As [`SculptConfig::from_json_str`], plus `SculptError::Io`.
    pub fn from_json_file(path: impl AsRef<Path>) -> SculptResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
