//! Capability traits for the host runtime.
//!
//! The sculpting core does not tokenize text or load embedding weights.
//! Hosts plug those in through two traits:
//!
//! ```text
//! Tokenizer (trait)
//! └── tokenize(&str) -> TokenizedText          // branch -> batches of (token, attention)
//!
//! EmbeddingProvider (trait)
//! ├── table(branch) -> Arc<EmbeddingTable>     // read-only token embedding rows
//! └── branches() -> Vec<String>                // registered branch names
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SculptError, SculptResult};
use crate::vector::EmbeddingTable;

/// One token id with its external attention weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenWeight {
    /// Token id, a row index into the branch's embedding table.
    pub token: u32,
    /// Per-token salience. Passed through unchanged to the encoder.
    pub attention: f32,
}

impl TokenWeight {
    /// Create a token weight.
    pub fn new(token: u32, attention: f32) -> Self {
        Self { token, attention }
    }
}

/// Tokenizer output: per branch, a sequence of token batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenizedText {
    /// Branch name to batches of tokens.
    pub branches: BTreeMap<String, Vec<Vec<TokenWeight>>>,
}

impl TokenizedText {
    /// Create empty tokenizer output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of tokens to `branch`.
    pub fn push_batch(&mut self, branch: impl Into<String>, batch: Vec<TokenWeight>) {
        self.branches.entry(branch.into()).or_default().push(batch);
    }

    /// Builder form of [`TokenizedText::push_batch`].
    pub fn with_batch(mut self, branch: impl Into<String>, batch: Vec<TokenWeight>) -> Self {
        self.push_batch(branch, batch);
        self
    }

    /// Total number of tokens over all branches.
    pub fn token_count(&self) -> usize {
        self.branches
            .values()
            .flat_map(|batches| batches.iter())
            .map(Vec::len)
            .sum()
    }
}

/// Turns text into per-branch token batches.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text` for every branch the host encodes.
    fn tokenize(&self, text: &str) -> SculptResult<TokenizedText>;
}

/// Supplies read-only embedding tables keyed by branch name.
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding table for `branch`.
    ///
    /// # Errors
    ///
    /// Returns `SculptError::UnknownBranch` if the branch has no table.
    fn table(&self, branch: &str) -> SculptResult<Arc<EmbeddingTable>>;

    /// Names of all branches with a table.
    fn branches(&self) -> Vec<String>;
}

/// Embedding provider backed by tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmbeddingProvider {
    tables: HashMap<String, Arc<EmbeddingTable>>,
}

impl InMemoryEmbeddingProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` under `branch`, replacing any previous table.
    pub fn insert(&mut self, branch: impl Into<String>, table: EmbeddingTable) {
        self.tables.insert(branch.into(), Arc::new(table));
    }

    /// Builder form of [`InMemoryEmbeddingProvider::insert`].
    pub fn with_table(mut self, branch: impl Into<String>, table: EmbeddingTable) -> Self {
        self.insert(branch, table);
        self
    }
}

impl EmbeddingProvider for InMemoryEmbeddingProvider {
    fn table(&self, branch: &str) -> SculptResult<Arc<EmbeddingTable>> {
        self.tables
            .get(branch)
            .cloned()
            .ok_or_else(|| SculptError::UnknownBranch(branch.to_string()))
    }

    fn branches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}
