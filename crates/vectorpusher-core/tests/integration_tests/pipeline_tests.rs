//! Token-level pipeline over an in-memory provider.

use std::sync::Arc;

use vectorpusher_core::vector::l2_norm;
use vectorpusher_core::{
    EmbeddingProvider, EmbeddingTable, InMemoryEmbeddingProvider, SculptConfig, SculptError,
    SculptResult, TokenSculptor, TokenWeight, TokenizedText, Tokenizer,
};

use super::helpers::{clustered_table, generate_table, rng};

/// Splits on whitespace and maps each word to `len % rows`, for two branches.
struct WordLengthTokenizer {
    rows: u32,
}

impl Tokenizer for WordLengthTokenizer {
    fn tokenize(&self, text: &str) -> SculptResult<TokenizedText> {
        if text.trim().is_empty() {
            return Err(SculptError::EmptyInput);
        }
        let batch: Vec<TokenWeight> = std::iter::once(TokenWeight::new(0, 1.0))
            .chain(
                text.split_whitespace()
                    .map(|w| TokenWeight::new(1 + w.len() as u32 % (self.rows - 1), 1.0)),
            )
            .collect();
        Ok(TokenizedText::new()
            .with_batch("l", batch.clone())
            .with_batch("g", batch))
    }
}

fn provider(rows: usize, dim: usize) -> Arc<dyn EmbeddingProvider> {
    let mut r = rng(2000);
    Arc::new(
        InMemoryEmbeddingProvider::new()
            .with_table("l", clustered_table(&mut r, rows / 8, 8, dim))
            .with_table("g", generate_table(rows, dim, 17)),
    )
}

#[test]
fn test_sculpt_text_end_to_end() {
    let sculptor = TokenSculptor::new(provider(64, 12), SculptConfig::default().with_ignored_tokens([0]));
    let tokenizer = WordLengthTokenizer { rows: 64 };

    let out = sculptor
        .sculpt_text(&tokenizer, "a quiet harbor at dawn", 0.6)
        .unwrap();

    assert_eq!(out.branches.len(), 2);
    for batches in out.branches.values() {
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.len(), 6);
        assert!(batch[0].vector.is_none(), "ignored start token was sculpted");
        assert!(batch[1..].iter().all(|t| t.vector.is_some()));
    }
    assert_eq!(out.stats.skipped, 2);
    assert_eq!(out.stats.sculpted, 10);
}

#[test]
fn test_sculpt_text_preserves_shape_and_magnitude() {
    let provider = provider(64, 12);
    let sculptor = TokenSculptor::new(provider.clone(), SculptConfig::default());
    let tokens = TokenizedText::new()
        .with_batch("l", vec![TokenWeight::new(5, 1.0), TokenWeight::new(9, 0.3)])
        .with_batch("l", vec![TokenWeight::new(40, 0.8)]);

    let out = sculptor.sculpt_tokens(&tokens, 1.0).unwrap();
    let table = provider.table("l").unwrap();
    let batches = &out.branches["l"];
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1][0].token, 40);
    for token in batches.iter().flatten() {
        let original = table.row(token.token as usize).unwrap();
        let v = token.vector.as_ref().unwrap();
        assert!((l2_norm(v) - l2_norm(original)).abs() < 1e-4 * l2_norm(original).max(1.0));
    }
}

#[test]
fn test_branch_multiplier_changes_strength() {
    // Both branches share one table so only the branch multiplier differs.
    let table = EmbeddingTable::from_rows(vec![
        vec![1.0, 0.0, 0.0],
        vec![0.95, 0.3, 0.0],
        vec![0.9, 0.0, 0.4],
        vec![0.8, 0.5, 0.3],
        vec![0.2, 1.0, 0.0],
        vec![0.0, 0.3, 1.0],
        vec![0.6, 0.6, 0.5],
        vec![0.7, 0.1, 0.7],
    ])
    .unwrap();
    let provider = InMemoryEmbeddingProvider::new()
        .with_table("l", table.clone())
        .with_table("g", table);
    let sculptor = TokenSculptor::new(Arc::new(provider), SculptConfig::default());
    let batch = vec![TokenWeight::new(0, 1.0)];
    let tokens = TokenizedText::new()
        .with_batch("l", batch.clone())
        .with_batch("g", batch);

    let out = sculptor.sculpt_tokens(&tokens, 0.5).unwrap();
    let l = out.branches["l"][0][0].vector.clone().unwrap();
    let g = out.branches["g"][0][0].vector.clone().unwrap();
    let l_report = out.branches["l"][0][0].report.clone().unwrap();
    let g_report = out.branches["g"][0][0].report.clone().unwrap();
    assert!(!l_report.degenerate);
    assert!(!g_report.degenerate);
    assert_ne!(l, g);
}

#[test]
fn test_tokenizer_error_propagates() {
    let sculptor = TokenSculptor::new(provider(16, 4), SculptConfig::default());
    let tokenizer = WordLengthTokenizer { rows: 16 };
    assert!(matches!(
        sculptor.sculpt_text(&tokenizer, "   ", 0.5),
        Err(SculptError::EmptyInput)
    ));
}

#[test]
fn test_dimension_mismatch_between_branches_is_independent() {
    let provider = InMemoryEmbeddingProvider::new()
        .with_table("l", generate_table(16, 4, 1))
        .with_table("g", generate_table(16, 8, 2));
    let sculptor = TokenSculptor::new(Arc::new(provider), SculptConfig::clip_defaults());
    let tokens = TokenizedText::new()
        .with_batch("l", vec![TokenWeight::new(3, 1.0)])
        .with_batch("g", vec![TokenWeight::new(3, 1.0)]);
    let out = sculptor.sculpt_tokens(&tokens, 0.4).unwrap();
    assert_eq!(out.branches["l"][0][0].vector.as_ref().unwrap().len(), 4);
    assert_eq!(out.branches["g"][0][0].vector.as_ref().unwrap().len(), 8);
}
