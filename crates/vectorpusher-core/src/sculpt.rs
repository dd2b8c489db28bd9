//! The vector-to-vector sculpting boundary.
//!
//! [`sculpt_vector`] is the pure function the rest of the crate is built
//! around: given a token's embedding row, the table it came from, a
//! strength and an attention value, it returns a vector of the same
//! dimension and magnitude whose direction has been pulled toward the
//! token's neighborhood consensus.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blender::{BlendReport, MultiScaleBlender};
use crate::config::{SculptConfig, SculptMode};
use crate::error::SculptResult;
use crate::neighbors::NeighborSet;
use crate::schedule::{Schedule, ScheduleMapper, ScheduleOverrides};
use crate::trust_region::TrustRegionStepper;
use crate::vector::{EmbeddingTable, Vector};

/// Coerce an external attention value into `[0, 1]`.
///
/// Missing or non-finite values become 1.0; finite values are clamped.
///
/// # Example
///
/// ```
/// use vectorpusher_core::sculpt::coerce_attention;
///
/// assert_eq!(coerce_attention(None), 1.0);
/// assert_eq!(coerce_attention(Some(f32::NAN)), 1.0);
/// assert_eq!(coerce_attention(Some(0.25)), 0.25);
/// assert_eq!(coerce_attention(Some(4.0)), 1.0);
/// ```
pub fn coerce_attention(attention: Option<f32>) -> f32 {
    match attention {
        Some(a) if a.is_finite() => a.clamp(0.0, 1.0),
        _ => 1.0,
    }
}

/// Sculpted vector and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SculptOutcome {
    /// Output vector, same dimension and magnitude as the query.
    pub vector: Vector,
    /// Active schedule, `None` when strength was zero.
    pub schedule: Option<Schedule>,
    /// Blend diagnostics. Single-scale passes report no shrinking.
    pub report: BlendReport,
    /// Strength was zero and the query was returned untouched.
    pub identity: bool,
}

/// Reusable sculptor holding configuration and the pipeline components.
#[derive(Debug, Clone)]
pub struct VectorSculptor {
    config: SculptConfig,
    mapper: ScheduleMapper,
    blender: MultiScaleBlender,
}

impl Default for VectorSculptor {
    fn default() -> Self {
        Self::new(SculptConfig::default())
    }
}

impl VectorSculptor {
    /// Create a sculptor. The configuration is trusted; call
    /// [`SculptConfig::validate`] first for untrusted input.
    pub fn new(config: SculptConfig) -> Self {
        Self {
            mapper: ScheduleMapper::new(config.schedule.clone()),
            blender: MultiScaleBlender::new(config.blend.clone()),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SculptConfig {
        &self.config
    }

    /// Schedule for `strength` with optional overrides.
    pub fn schedule(&self, strength: f32, overrides: Option<&ScheduleOverrides>) -> Schedule {
        let schedule = self.mapper.map(strength);
        match overrides {
            Some(o) => schedule.with_overrides(o),
            None => schedule,
        }
    }

    /// Sculpt `query` against `table`.
    ///
    /// # Errors
    ///
    /// - `SculptError::DimensionMismatch` if the query and table dimensions differ.
    /// - `SculptError::InvalidParameter` if the overridden schedule is invalid.
    pub fn sculpt(
        &self,
        query: &[f32],
        table: &EmbeddingTable,
        strength: f32,
        attention: Option<f32>,
        overrides: Option<&ScheduleOverrides>,
    ) -> SculptResult<SculptOutcome> {
        table.check_dim(query)?;

        if !(strength > 0.0) {
            return Ok(SculptOutcome {
                vector: query.to_vec(),
                schedule: None,
                report: BlendReport {
                    converged: true,
                    ..Default::default()
                },
                identity: true,
            });
        }

        let schedule = self.schedule(strength, overrides);
        schedule.validate()?;
        let attention = coerce_attention(attention);

        let (vector, report) = match self.config.mode {
            SculptMode::MultiScale => {
                let outcome = self.blender.blend(query, table, &schedule, attention);
                (outcome.vector, outcome.report)
            }
            SculptMode::SingleScale => self.single_scale(query, table, &schedule),
        };

        if self.config.debug {
            debug!(
                strength,
                attention,
                k = schedule.k,
                angle_deg = report.angle_deg,
                kl = report.kl,
                "Sculpted vector"
            );
        }

        Ok(SculptOutcome {
            vector,
            schedule: Some(schedule),
            report,
            identity: false,
        })
    }

    fn single_scale(
        &self,
        query: &[f32],
        table: &EmbeddingTable,
        schedule: &Schedule,
    ) -> (Vector, BlendReport) {
        let neighbors: NeighborSet =
            self.blender.neighbor_set(query, table, schedule.k, schedule.tau);
        let outcome = TrustRegionStepper::new(self.config.blend.epsilon).step(
            query,
            table,
            &neighbors,
            schedule.theta_max_deg,
            schedule.step_scale,
        );
        let report = BlendReport {
            kl: 0.0,
            shrink_iterations: 0,
            converged: true,
            confidences: Vec::new(),
            angle_deg: outcome.angle_deg,
            degenerate: outcome.degenerate,
        };
        (outcome.vector, report)
    }
}

/// Sculpt one embedding vector with the default configuration.
///
/// Output has the query's dimension and magnitude. `strength <= 0`
/// returns the query unchanged.
///
/// # Errors
///
/// Returns `SculptError::DimensionMismatch` if `query` does not match the
/// table, or `SculptError::InvalidParameter` for an invalid override.
///
/// # Example
///
/// ```
/// use vectorpusher_core::{sculpt_vector, EmbeddingTable};
/// use vectorpusher_core::vector::l2_norm;
///
/// let table = EmbeddingTable::from_rows(vec![
///     vec![1.0, 0.0, 0.0],
///     vec![0.8, 0.6, 0.0],
///     vec![0.6, 0.0, 0.8],
///     vec![0.0, 1.0, 0.0],
/// ]).unwrap();
/// let query = table.row(0).unwrap().to_vec();
///
/// let out = sculpt_vector(&query, &table, 0.8, Some(1.0), None).unwrap();
/// assert!((l2_norm(&out) - l2_norm(&query)).abs() < 1e-4);
///
/// let same = sculpt_vector(&query, &table, 0.0, None, None).unwrap();
/// assert_eq!(same, query);
/// ```
pub fn sculpt_vector(
    query: &[f32],
    table: &EmbeddingTable,
    strength: f32,
    attention: Option<f32>,
    overrides: Option<&ScheduleOverrides>,
) -> SculptResult<Vector> {
    VectorSculptor::default()
        .sculpt(query, table, strength, attention, overrides)
        .map(|outcome| outcome.vector)
}
