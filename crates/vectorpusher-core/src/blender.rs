//! Multi-scale blend with a divergence-bounded shrink loop.
//!
//! Runs the neighbor -> weighting -> trust-region pipeline at several
//! neighbor scales, fuses the displacements weighted by attention and by
//! the entropy-derived confidence of each scale, then halves the fused
//! displacement until the proposal's implied weighting of the baseline
//! neighbors stays within `kappa` (KL) of the baseline weighting.
//!
//! ```text
//! propose -> check --(KL <= kappa)--> accept
//!              |  ^
//!    (KL > kappa) |
//!              v  |
//!             shrink  (budget exhausted -> accept most-shrunk proposal)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BlendConfig, ScaleFactor};
use crate::divergence::{compute_kl_divergence, consensus_confidence};
use crate::neighbors::{NeighborFinder, NeighborSet};
use crate::schedule::Schedule;
use crate::trust_region::{trust_region_factor, TrustRegionStepper};
use crate::vector::{
    add, angle_between_deg, dot, l2_norm, normalize_with_epsilon, scale, sub, with_magnitude,
    EmbeddingTable, Vector,
};
use crate::weighting::{softmax, RobustWeighter};

/// Neighbor count and temperature of one blending scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleVariant {
    /// Neighbor count.
    pub k: usize,
    /// Softmax temperature.
    pub tau: f32,
}

impl ScaleVariant {
    /// Derive a variant from the base schedule.
    ///
    /// `k = max(k_min, round(k_factor * k0))`, `tau = tau_factor * tau0`.
    pub fn derive(factor: &ScaleFactor, schedule: &Schedule) -> Self {
        let k = (factor.k_factor * schedule.k as f32).round_ties_even() as usize;
        Self {
            k: k.max(factor.k_min),
            tau: factor.tau_factor * schedule.tau,
        }
    }
}

/// Diagnostics of one blend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendReport {
    /// `KL(alpha0 || beta)` of the accepted proposal.
    pub kl: f32,
    /// Number of times the fused displacement was halved.
    pub shrink_iterations: usize,
    /// Whether the accepted proposal satisfies the divergence bound.
    pub converged: bool,
    /// Confidence of each scale, in scale order.
    pub confidences: Vec<f32>,
    /// Angle between query and result, in degrees.
    pub angle_deg: f32,
    /// No neighbor or no consensus direction was available.
    pub degenerate: bool,
}

/// Sculpted vector plus blend diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendOutcome {
    /// Result with the query's magnitude.
    pub vector: Vector,
    /// Diagnostics.
    pub report: BlendReport,
}

/// Orchestrates the multi-scale neighbor-consensus step.
#[derive(Debug, Clone)]
pub struct MultiScaleBlender {
    config: BlendConfig,
    finder: NeighborFinder,
    weighter: RobustWeighter,
    stepper: TrustRegionStepper,
}

impl Default for MultiScaleBlender {
    fn default() -> Self {
        Self::new(BlendConfig::default())
    }
}

impl MultiScaleBlender {
    /// Create a blender from its configuration.
    pub fn new(config: BlendConfig) -> Self {
        Self {
            finder: NeighborFinder::from_config(&config),
            weighter: RobustWeighter::from_config(&config),
            stepper: TrustRegionStepper::new(config.epsilon),
            config,
        }
    }

    /// Blend configuration.
    pub fn config(&self) -> &BlendConfig {
        &self.config
    }

    /// The scales derived from `schedule`, in configured order.
    pub fn variants(&self, schedule: &Schedule) -> Vec<ScaleVariant> {
        self.config
            .scales
            .iter()
            .map(|f| ScaleVariant::derive(f, schedule))
            .collect()
    }

    /// Neighbor set of `query` at `(k, tau)` with robust weights.
    pub fn neighbor_set(&self, query: &[f32], table: &EmbeddingTable, k: usize, tau: f32) -> NeighborSet {
        let candidates = self.finder.find(query, table, k);
        let weights = self.weighter.weights(&candidates.similarities, tau);
        NeighborSet::new(candidates.indices, weights)
    }

    /// Weighting a proposal implies over a fixed neighbor set.
    fn implied_weights(&self, proposal: &[f32], table: &EmbeddingTable, indices: &[usize], tau: f32) -> Vec<f32> {
        let pn = normalize_with_epsilon(proposal, self.config.epsilon);
        let sims: Vec<f32> = indices
            .iter()
            .map(|&i| {
                table
                    .normalized_row(i)
                    .map(|row| dot(row, &pn))
                    .filter(|s| s.is_finite())
                    .unwrap_or(-1.0)
            })
            .collect();
        if self.config.robust_divergence_check {
            self.weighter.weights(&sims, tau)
        } else {
            softmax(&sims.iter().map(|s| s * tau).collect::<Vec<_>>())
        }
    }

    /// Sculpt `query` with the multi-scale blend.
    ///
    /// `attention` is expected in `[0, 1]`; callers coerce malformed values
    /// beforehand (see [`crate::sculpt::coerce_attention`]).
    pub fn blend(
        &self,
        query: &[f32],
        table: &EmbeddingTable,
        schedule: &Schedule,
        attention: f32,
    ) -> BlendOutcome {
        let mag = l2_norm(query);
        let eps = self.config.epsilon;

        // Baseline distribution over the base-scale neighbors.
        let baseline = self.neighbor_set(query, table, schedule.k, schedule.tau);
        if baseline.is_empty() {
            debug!("No neighbors available, returning query unchanged");
            return BlendOutcome {
                vector: query.to_vec(),
                report: BlendReport {
                    converged: true,
                    degenerate: true,
                    ..Default::default()
                },
            };
        }

        let attention_gain = 0.5 + 0.5 * attention;
        let n_scales = self.config.scales.len() as f32;
        let mut combined = vec![0.0f32; query.len()];
        let mut confidences = Vec::with_capacity(self.config.scales.len());
        let mut any_step = false;

        for variant in self.variants(schedule) {
            let neighbors = self.neighbor_set(query, table, variant.k, variant.tau);
            let confidence = consensus_confidence(&neighbors.weights);
            confidences.push(confidence);

            let step_scale = schedule.step_scale * attention_gain * confidence / n_scales;
            if neighbors.is_empty() || !(step_scale > 0.0) {
                continue;
            }
            let outcome = self.stepper.step(
                query,
                table,
                &neighbors,
                schedule.theta_max_deg,
                step_scale,
            );
            if !outcome.degenerate {
                any_step = true;
                combined = add(&combined, &sub(&outcome.vector, query));
            }
        }

        if !any_step {
            debug!(?confidences, "No scale produced a step, returning query unchanged");
            return BlendOutcome {
                vector: query.to_vec(),
                report: BlendReport {
                    kl: 0.0,
                    converged: true,
                    confidences,
                    degenerate: true,
                    ..Default::default()
                },
            };
        }

        // Fused scales may jointly exceed the per-step cap under aggressive
        // overrides. Halving afterwards only moves the proposal closer.
        let factor = trust_region_factor(query, &combined, schedule.theta_max_deg);
        if factor < 1.0 {
            combined = scale(&combined, factor);
        }

        let mut proposal = add(query, &combined);
        let mut shrink_iterations = 0usize;
        let mut kl = f32::INFINITY;
        let mut converged = false;

        while shrink_iterations < self.config.max_shrink_iterations {
            let beta = self.implied_weights(&proposal, table, &baseline.indices, schedule.tau);
            kl = compute_kl_divergence(&baseline.weights, &beta, eps);
            if kl <= self.config.kappa {
                converged = true;
                break;
            }
            combined = scale(&combined, 0.5);
            proposal = add(query, &combined);
            shrink_iterations += 1;
        }

        if !converged {
            let beta = self.implied_weights(&proposal, table, &baseline.indices, schedule.tau);
            kl = compute_kl_divergence(&baseline.weights, &beta, eps);
            converged = kl <= self.config.kappa;
            if !converged {
                warn!(
                    kl,
                    kappa = self.config.kappa,
                    shrink_iterations,
                    "Divergence bound unmet after shrink budget, accepting most-shrunk proposal"
                );
            }
        }

        let vector = with_magnitude(&proposal, mag);
        let angle_deg = angle_between_deg(query, &vector);
        debug!(
            kl,
            shrink_iterations,
            converged,
            angle_deg,
            "Blend accepted"
        );

        BlendOutcome {
            vector,
            report: BlendReport {
                kl,
                shrink_iterations,
                converged,
                confidences,
                angle_deg,
                degenerate: false,
            },
        }
    }
}
