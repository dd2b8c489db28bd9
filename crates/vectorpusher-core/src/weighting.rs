//! Outlier-robust neighbor weighting ("winsorized softmax").
//!
//! Raw similarities are scaled by a temperature, clamped to
//! `median +/- c * MAD` and passed through a softmax. Clamping bounds the
//! influence of a near-duplicate row without discarding it.

use std::cmp::Ordering;

use crate::config::BlendConfig;
use crate::vector::EPSILON;

/// Numerically stable softmax.
///
/// Falls back to the uniform distribution when the input cannot be
/// normalized (all `-inf`, or a non-finite partition sum).
///
/// # Example
///
/// ```
/// use vectorpusher_core::weighting::softmax;
///
/// let w = softmax(&[1.0, 2.0, 3.0]);
/// assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
/// assert!(w[2] > w[1] && w[1] > w[0]);
/// ```
pub fn softmax(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return uniform(values.len());
    }

    let exps: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { ((v - max) as f64).exp() } else { 0.0 })
        .collect();
    let sum: f64 = exps.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return uniform(values.len());
    }
    exps.iter().map(|e| (e / sum) as f32).collect()
}

fn uniform(n: usize) -> Vec<f32> {
    vec![1.0 / n as f32; n]
}

/// Median of a slice. Even lengths average the two middle values.
///
/// Returns 0.0 for an empty slice.
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around `center`.
pub fn median_abs_deviation(values: &[f32], center: f32) -> f32 {
    let deviations: Vec<f32> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Clamp each value into `[m - c * mad, m + c * mad]`.
///
/// `mad` is floored by `epsilon` so the band never collapses to a point
/// that would turn every value into exactly the median.
pub fn winsorize(values: &[f32], clip_factor: f32, epsilon: f32) -> Vec<f32> {
    let m = median(values);
    let mad = median_abs_deviation(values, m) + epsilon;
    let lo = m - clip_factor * mad;
    let hi = m + clip_factor * mad;
    values.iter().map(|v| v.clamp(lo, hi)).collect()
}

/// Turns raw neighbor similarities into a probability distribution.
#[derive(Debug, Clone, Copy)]
pub struct RobustWeighter {
    clip_factor: f32,
    epsilon: f32,
}

impl Default for RobustWeighter {
    fn default() -> Self {
        Self {
            clip_factor: 1.5,
            epsilon: EPSILON,
        }
    }
}

impl RobustWeighter {
    /// Create a weighter with an explicit clip factor.
    pub fn new(clip_factor: f32, epsilon: f32) -> Self {
        Self {
            clip_factor,
            epsilon,
        }
    }

    /// Create from the blend configuration.
    pub fn from_config(config: &BlendConfig) -> Self {
        Self::new(config.clip_factor, config.epsilon)
    }

    /// Winsorization clip factor `c`.
    pub fn clip_factor(&self) -> f32 {
        self.clip_factor
    }

    /// Weight similarities at temperature `tau`.
    ///
    /// Non-finite similarities are treated as `-1.0` before scaling, so the
    /// result is always non-negative and sums to one.
    pub fn weights(&self, similarities: &[f32], tau: f32) -> Vec<f32> {
        let scaled: Vec<f32> = similarities
            .iter()
            .map(|s| if s.is_finite() { *s } else { -1.0 })
            .map(|s| s * tau)
            .collect();
        softmax(&winsorize(&scaled, self.clip_factor, self.epsilon))
    }
}
