//! Multi-scale blending and robust weighting settings.

use serde::{Deserialize, Serialize};

/// Which stepping pipeline a sculpting pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SculptMode {
    /// Three neighbor scales fused and bounded by the divergence check.
    #[default]
    MultiScale,
    /// One trust-region step at the base schedule, no divergence check.
    SingleScale,
}

/// Neighbor-count and temperature factors for one blending scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor {
    /// Multiplier applied to the base neighbor count.
    pub k_factor: f32,
    /// Lower bound on the derived neighbor count.
    pub k_min: usize,
    /// Multiplier applied to the base temperature.
    pub tau_factor: f32,
}

/// Settings for the neighbor-consensus blend.
///
/// Defaults: `kappa = 0.03`, five shrink iterations, winsorization clip
/// `c = 1.5`, and half / base / wide neighbor scales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Upper bound on `KL(alpha0 || beta)` for accepting a proposal.
    /// Range: `(0, 10]`
    pub kappa: f32,

    /// Maximum number of times the combined displacement is halved.
    /// Range: `[0, 64]`
    pub max_shrink_iterations: usize,

    /// Winsorization clip factor `c` (bounds are `median +/- c * MAD`).
    /// Range: `(0, 10]`
    pub clip_factor: f32,

    /// Guard for divisions and logarithms near zero.
    /// Range: `[1e-12, 1e-4]`
    pub epsilon: f32,

    /// Elementwise tolerance for recognising the query's own row.
    /// Range: `[0, 1e-2]`
    pub self_match_tolerance: f32,

    /// Neighbor scales combined by the multi-scale blend.
    pub scales: Vec<ScaleFactor>,

    /// Weight the divergence check's proposal distribution with the
    /// winsorized softmax used for the baseline, instead of a plain softmax.
    pub robust_divergence_check: bool,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            kappa: 0.03,
            max_shrink_iterations: 5,
            clip_factor: 1.5,
            epsilon: 1e-8,
            self_match_tolerance: 1e-6,
            scales: vec![
                ScaleFactor {
                    k_factor: 0.5,
                    k_min: 4,
                    tau_factor: 0.9,
                },
                ScaleFactor {
                    k_factor: 1.0,
                    k_min: 1,
                    tau_factor: 1.0,
                },
                ScaleFactor {
                    k_factor: 1.5,
                    k_min: 5,
                    tau_factor: 1.1,
                },
            ],
            robust_divergence_check: true,
        }
    }
}

impl BlendConfig {
    /// Validate the blend configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.kappa > 0.0 && self.kappa <= 10.0) {
            return Err(format!("kappa must be in (0, 10], got {}", self.kappa));
        }
        if self.max_shrink_iterations > 64 {
            return Err(format!(
                "max_shrink_iterations must be <= 64, got {}",
                self.max_shrink_iterations
            ));
        }
        if !(self.clip_factor > 0.0 && self.clip_factor <= 10.0) {
            return Err(format!(
                "clip_factor must be in (0, 10], got {}",
                self.clip_factor
            ));
        }
        if !(1e-12..=1e-4).contains(&self.epsilon) {
            return Err(format!(
                "epsilon must be in [1e-12, 1e-4], got {}",
                self.epsilon
            ));
        }
        if !(0.0..=1e-2).contains(&self.self_match_tolerance) {
            return Err(format!(
                "self_match_tolerance must be in [0, 1e-2], got {}",
                self.self_match_tolerance
            ));
        }
        if self.scales.is_empty() {
            return Err("scales must contain at least one entry".to_string());
        }
        for (i, scale) in self.scales.iter().enumerate() {
            if !(scale.k_factor > 0.0 && scale.k_factor.is_finite()) {
                return Err(format!(
                    "scales[{}].k_factor must be > 0, got {}",
                    i, scale.k_factor
                ));
            }
            if !(scale.tau_factor > 0.0 && scale.tau_factor.is_finite()) {
                return Err(format!(
                    "scales[{}].tau_factor must be > 0, got {}",
                    i, scale.tau_factor
                ));
            }
            if scale.k_min == 0 {
                return Err(format!("scales[{}].k_min must be > 0", i));
            }
        }
        Ok(())
    }
}
