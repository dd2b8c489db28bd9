//! Sculpt command: sculpt rows of a JSON embedding table.
//!
//! # Usage
//!
//! ```bash
//! vectorpusher sculpt --table vocab.json --tokens 3,17,42 --strength 0.6
//! vectorpusher sculpt --table vocab.json --tokens 5 --strength 1 --attention 0.4 --single-scale
//! ```
//!
//! The table file is a JSON array of rows, one row per token id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use vectorpusher_core::{
    params_summary, EmbeddingTable, InMemoryEmbeddingProvider, SculptMode, SculptedText,
    TokenSculptor, TokenWeight, TokenizedText,
};

use super::{emit, load_config};

/// Arguments for the sculpt command.
#[derive(Args, Debug)]
pub struct SculptArgs {
    /// JSON embedding table (array of rows)
    #[arg(long)]
    pub table: PathBuf,

    /// Comma-separated token ids to sculpt
    #[arg(long, value_delimiter = ',', required = true)]
    pub tokens: Vec<u32>,

    /// Sculpting strength in [0, 1]
    #[arg(long)]
    pub strength: f32,

    /// Attention applied to every token (default 1.0)
    #[arg(long)]
    pub attention: Option<f32>,

    /// Branch name, selects the strength multiplier
    #[arg(long, default_value = "l")]
    pub branch: String,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run one trust-region step instead of the multi-scale blend
    #[arg(long)]
    pub single_scale: bool,
}

/// Sculpt command output.
#[derive(Debug, Serialize)]
pub struct SculptReport {
    pub params: String,
    pub branch: String,
    pub result: SculptedText,
}

/// Load an embedding table from a JSON array of rows.
pub fn load_table(path: &Path) -> Result<EmbeddingTable> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read table {}", path.display()))?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&json)
        .with_context(|| format!("table {} is not a JSON array of rows", path.display()))?;
    EmbeddingTable::from_rows(rows).with_context(|| format!("invalid table {}", path.display()))
}

/// Sculpt the requested tokens.
pub fn run_sculpt(args: &SculptArgs) -> Result<SculptReport> {
    let mut config = load_config(args.config.as_deref())?;
    if args.single_scale {
        config.mode = SculptMode::SingleScale;
    }

    let table = load_table(&args.table)?;
    info!(rows = table.len(), dim = table.dim(), "Loaded embedding table");

    let attention = args.attention.unwrap_or(1.0);
    let batch = args
        .tokens
        .iter()
        .map(|&token| TokenWeight::new(token, attention))
        .collect();
    let tokens = TokenizedText::new().with_batch(args.branch.clone(), batch);

    let provider = InMemoryEmbeddingProvider::new().with_table(args.branch.clone(), table);
    let result = TokenSculptor::new(Arc::new(provider), config)
        .sculpt_tokens(&tokens, args.strength)
        .context("sculpting failed")?;

    Ok(SculptReport {
        params: params_summary(args.strength),
        branch: args.branch.clone(),
        result,
    })
}

/// Execute the sculpt command.
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 1: Unreadable table or config, or a token outside the table
pub fn handle_sculpt(args: SculptArgs) -> i32 {
    emit(run_sculpt(&args))
}
