//! CLI command handlers
//!
//! # Modules
//!
//! - `schedule`: Strength-to-schedule inspection
//! - `sculpt`: Sculpt rows of a JSON embedding table

pub mod schedule;
pub mod sculpt;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::error;
use vectorpusher_core::SculptConfig;

/// Load and validate a configuration file, or use the defaults.
pub fn load_config(path: Option<&Path>) -> Result<SculptConfig> {
    match path {
        // from_json_file validates on load
        Some(path) => SculptConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let config = SculptConfig::default();
            config
                .validate()
                .map_err(|reason| anyhow!("invalid configuration: {reason}"))?;
            Ok(config)
        }
    }
}

/// Print `value` as pretty JSON on stdout and map the result to an exit code.
pub fn emit<T: Serialize>(result: Result<T>) -> i32 {
    let rendered = result.and_then(|value| {
        serde_json::to_string_pretty(&value).context("failed to serialize output")
    });
    match rendered {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            error!("{e:#}");
            1
        }
    }
}
