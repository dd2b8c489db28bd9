//! Token-level sculpting over tokenizer output.
//!
//! For each branch the strength is rescaled by the branch multiplier and
//! turned into a schedule, then every token that is not ignored has its
//! embedding row sculpted. Tokens are independent, so each batch is
//! processed with a parallel iterator over a shared read-only table.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::blender::BlendReport;
use crate::config::SculptConfig;
use crate::error::SculptResult;
use crate::provider::{EmbeddingProvider, TokenWeight, TokenizedText, Tokenizer};
use crate::schedule::ScheduleOverrides;
use crate::sculpt::VectorSculptor;
use crate::vector::{EmbeddingTable, Vector};

/// A token after sculpting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SculptedToken {
    /// Original token id.
    pub token: u32,
    /// Original attention weight, unchanged.
    pub attention: f32,
    /// Sculpted embedding. `None` leaves the encoder's own lookup in place.
    pub vector: Option<Vector>,
    /// Blend diagnostics for sculpted tokens.
    pub report: Option<BlendReport>,
}

impl SculptedToken {
    fn passthrough(tw: &TokenWeight) -> Self {
        Self {
            token: tw.token,
            attention: tw.attention,
            vector: None,
            report: None,
        }
    }
}

/// Counters over a sculpting run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SculptStats {
    /// Tokens whose vector was replaced.
    pub sculpted: usize,
    /// Ignored tokens, or every token when strength is zero.
    pub skipped: usize,
    /// Sculpted tokens accepted without meeting the divergence bound.
    pub unconverged: usize,
    /// Sculpted tokens with no usable neighbor consensus.
    pub degenerate: usize,
}

impl SculptStats {
    fn record(&mut self, token: &SculptedToken) {
        match &token.report {
            None => self.skipped += 1,
            Some(report) => {
                self.sculpted += 1;
                if !report.converged {
                    self.unconverged += 1;
                }
                if report.degenerate {
                    self.degenerate += 1;
                }
            }
        }
    }

    /// Add another run's counters to this one.
    pub fn merge(&mut self, other: &SculptStats) {
        self.sculpted += other.sculpted;
        self.skipped += other.skipped;
        self.unconverged += other.unconverged;
        self.degenerate += other.degenerate;
    }
}

/// Sculpting output with the same branch/batch shape as the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SculptedText {
    /// Branch name to batches of sculpted tokens.
    pub branches: BTreeMap<String, Vec<Vec<SculptedToken>>>,
    /// Counters over all branches.
    pub stats: SculptStats,
}

/// Human-readable parameter line reported alongside the conditioning.
///
/// # Example
///
/// ```
/// use vectorpusher_core::pipeline::params_summary;
///
/// assert_eq!(params_summary(0.5), "vectorpusher: sculpt_strength=0.5");
/// assert_eq!(params_summary(0.33333), "vectorpusher: sculpt_strength=0.333");
/// ```
pub fn params_summary(strength: f32) -> String {
    let rounded = (strength as f64 * 1000.0).round() / 1000.0;
    format!("vectorpusher: sculpt_strength={:?}", rounded)
}

/// Sculpts every token of tokenizer output against per-branch tables.
#[derive(Clone)]
pub struct TokenSculptor {
    provider: Arc<dyn EmbeddingProvider>,
    sculptor: VectorSculptor,
    overrides: Option<ScheduleOverrides>,
}

impl std::fmt::Debug for TokenSculptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSculptor")
            .field("branches", &self.provider.branches())
            .field("sculptor", &self.sculptor)
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl TokenSculptor {
    /// Create a token sculptor.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: SculptConfig) -> Self {
        Self {
            provider,
            sculptor: VectorSculptor::new(config),
            overrides: None,
        }
    }

    /// Apply schedule overrides to every token.
    pub fn with_overrides(mut self, overrides: ScheduleOverrides) -> Self {
        self.overrides = (!overrides.is_empty()).then_some(overrides);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &SculptConfig {
        self.sculptor.config()
    }

    /// Tokenize `text` and sculpt the result.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer errors and those of [`TokenSculptor::sculpt_tokens`].
    pub fn sculpt_text(
        &self,
        tokenizer: &dyn Tokenizer,
        text: &str,
        strength: f32,
    ) -> SculptResult<SculptedText> {
        let tokens = tokenizer.tokenize(text)?;
        self.sculpt_tokens(&tokens, strength)
    }

    /// Sculpt every token of every branch.
    ///
    /// # Errors
    ///
    /// - `SculptError::UnknownBranch` if the provider has no table for a branch.
    /// - `SculptError::TokenOutOfRange` if a sculpted token has no table row.
    pub fn sculpt_tokens(&self, tokens: &TokenizedText, strength: f32) -> SculptResult<SculptedText> {
        let mut output = SculptedText::default();

        for (branch, batches) in &tokens.branches {
            let table = self.provider.table(branch)?;
            let branch_strength = self.config().branches.branch_strength(branch, strength);
            debug!(
                branch = branch.as_str(),
                strength,
                branch_strength,
                batches = batches.len(),
                "Sculpting branch"
            );

            let mut branch_stats = SculptStats::default();
            let mut sculpted_batches = Vec::with_capacity(batches.len());
            for batch in batches {
                let sculpted = batch
                    .par_iter()
                    .map(|tw| self.sculpt_token(&table, tw, branch_strength))
                    .collect::<SculptResult<Vec<_>>>()?;
                for token in &sculpted {
                    branch_stats.record(token);
                }
                sculpted_batches.push(sculpted);
            }
            debug!(
                branch = branch.as_str(),
                sculpted = branch_stats.sculpted,
                skipped = branch_stats.skipped,
                "Branch done"
            );
            output.stats.merge(&branch_stats);
            output.branches.insert(branch.clone(), sculpted_batches);
        }

        info!(
            sculpted = output.stats.sculpted,
            skipped = output.stats.skipped,
            unconverged = output.stats.unconverged,
            degenerate = output.stats.degenerate,
            "{}",
            params_summary(strength)
        );
        Ok(output)
    }

    fn sculpt_token(
        &self,
        table: &EmbeddingTable,
        tw: &TokenWeight,
        strength: f32,
    ) -> SculptResult<SculptedToken> {
        if !(strength > 0.0) || self.config().is_ignored(tw.token) {
            return Ok(SculptedToken::passthrough(tw));
        }
        let row = table.token_row(tw.token)?;
        let outcome = self.sculptor.sculpt(
            row,
            table,
            strength,
            Some(tw.attention),
            self.overrides.as_ref(),
        )?;
        Ok(SculptedToken {
            token: tw.token,
            attention: tw.attention,
            vector: Some(outcome.vector),
            report: Some(outcome.report),
        })
    }
}
