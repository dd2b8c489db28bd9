//! Information-theoretic measures over neighbor weight distributions.
//!
//! - [`compute_kl_divergence`]: `D_KL(P || Q) = sum_i P(i) * ln(P(i) / Q(i))`,
//!   the semantic-drift bound of the multi-scale blend.
//! - [`shannon_entropy`] and [`consensus_confidence`]: how concentrated a
//!   neighbor weighting is. A uniform weighting carries no preferred
//!   direction and gets confidence 0.
//!
//! All outputs are finite. Probabilities are floored at epsilon before any
//! logarithm.

/// Compute KL divergence between two probability distributions.
///
/// # Arguments
///
/// * `p` - The reference distribution
/// * `q` - The approximating distribution
/// * `epsilon` - Floor applied to both before taking logs
///
/// # Returns
///
/// `D_KL(P || Q)`, always non-negative. Returns 0.0 for empty or
/// mismatched distributions.
///
/// # Example
///
/// ```
/// use vectorpusher_core::divergence::compute_kl_divergence;
///
/// let p = vec![0.25, 0.25, 0.25, 0.25];
/// let q = vec![0.1, 0.2, 0.3, 0.4];
///
/// assert!(compute_kl_divergence(&p, &q, 1e-8) > 0.0);
/// assert!(compute_kl_divergence(&p, &p, 1e-8).abs() < 1e-6);
/// ```
pub fn compute_kl_divergence(p: &[f32], q: &[f32], epsilon: f32) -> f32 {
    if p.is_empty() || q.is_empty() || p.len() != q.len() {
        return 0.0;
    }

    let eps = epsilon.max(1e-15) as f64;
    let mut kl = 0.0f64;

    for (p_i, q_i) in p.iter().zip(q.iter()) {
        let p_val = (*p_i as f64).max(eps);
        let q_val = (*q_i as f64).max(eps);
        kl += p_val * (p_val / q_val).ln();
    }

    let result = kl.max(0.0) as f32;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Shannon entropy in nats. Zero-probability entries contribute nothing.
pub fn shannon_entropy(weights: &[f32]) -> f32 {
    let h: f64 = weights
        .iter()
        .filter(|w| **w > 0.0 && w.is_finite())
        .map(|w| {
            let w = *w as f64;
            -w * w.ln()
        })
        .sum();
    h.max(0.0) as f32
}

/// Entropy-derived confidence `1 - H(w) / ln(n)` in `[0, 1]`.
///
/// A single-neighbor (or empty) weighting is fully confident: there is no
/// alternative direction to be ambiguous about.
///
/// # Example
///
/// ```
/// use vectorpusher_core::divergence::consensus_confidence;
///
/// assert!(consensus_confidence(&[0.25; 4]) < 1e-6);
/// assert!((consensus_confidence(&[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
/// ```
pub fn consensus_confidence(weights: &[f32]) -> f32 {
    if weights.len() <= 1 {
        return 1.0;
    }
    let max_entropy = (weights.len() as f32).ln();
    (1.0 - shannon_entropy(weights) / max_entropy).clamp(0.0, 1.0)
}
