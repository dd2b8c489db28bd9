//! Trust-region-limited step toward a weighted neighbor consensus.
//!
//! The consensus direction is projected onto the tangent space of the unit
//! sphere at the query direction, so the step only rotates the vector. The
//! rotation is capped at `theta_max_deg`, and the result is rescaled back
//! to the query's original magnitude.

use tracing::trace;

use crate::neighbors::NeighborSet;
use crate::vector::{
    add_scaled, angle_between_deg, dot, l2_norm, normalize_with_epsilon, scale, sub, with_magnitude,
    EmbeddingTable, Vector, EPSILON,
};

/// Result of a single trust-region step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Stepped vector with the query's magnitude.
    pub vector: Vector,
    /// Angle between query and result, in degrees.
    pub angle_deg: f32,
    /// Whether the angular cap was applied.
    pub capped: bool,
    /// Whether the consensus direction vanished and the query was returned.
    pub degenerate: bool,
}

/// Factor in `(0, 1]` that shrinks `displacement` until the direction of
/// `origin + factor * displacement` is exactly `theta_max_deg` from `origin`.
///
/// Returns 1.0 when the displacement is already inside the cap. The
/// displacement is split into a radial part `r` along `origin` and a tangent
/// part of length `t`; the angle along the segment is `atan2(c t, |o| + c r)`,
/// which is solved for `c` in closed form. Obtuse caps fall back to bisection.
pub fn trust_region_factor(origin: &[f32], displacement: &[f32], theta_max_deg: f32) -> f32 {
    let target = origin
        .iter()
        .zip(displacement)
        .map(|(o, d)| o + d)
        .collect::<Vector>();
    let angle = angle_between_deg(origin, &target);
    if !(angle > theta_max_deg) || theta_max_deg >= 180.0 {
        return 1.0;
    }
    if theta_max_deg <= 0.0 {
        return 0.0;
    }

    let mag = l2_norm(origin);
    let on = normalize_with_epsilon(origin, EPSILON);
    let radial = dot(displacement, &on);
    let tangent = l2_norm(&add_scaled(displacement, &on, -radial));
    let tan_theta = theta_max_deg.to_radians().tan();

    if theta_max_deg < 90.0 {
        let denom = tangent - radial * tan_theta;
        if denom > 0.0 {
            let c = mag * tan_theta / denom;
            if c.is_finite() && c > 0.0 && c <= 1.0 {
                return c;
            }
        }
    }

    // Angle grows monotonically along the segment from the origin.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..48 {
        let mid = 0.5 * (lo + hi);
        let candidate = add_scaled(origin, displacement, mid);
        if angle_between_deg(origin, &candidate) > theta_max_deg {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

/// Computes one capped step of a query toward its neighbor consensus.
#[derive(Debug, Clone, Copy)]
pub struct TrustRegionStepper {
    epsilon: f32,
}

impl Default for TrustRegionStepper {
    fn default() -> Self {
        Self { epsilon: EPSILON }
    }
}

impl TrustRegionStepper {
    /// Create a stepper with an explicit epsilon guard.
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    /// Step `query` toward the weighted mean of its neighbors' rows.
    ///
    /// # Algorithm
    ///
    /// 1. `t = sum_i w_i * Wn[idx_i]`, minus its component along `normalize(query)`
    /// 2. Degenerate (`||t|| < eps`): return the query unchanged
    /// 3. `w* = query + step_scale * ||query|| * normalize(t)`
    /// 4. If the rotation exceeds `theta_max_deg`, shrink `w* - query` onto the cap
    /// 5. Return `normalize(w*) * ||query||`
    pub fn step(
        &self,
        query: &[f32],
        table: &EmbeddingTable,
        neighbors: &NeighborSet,
        theta_max_deg: f32,
        step_scale: f32,
    ) -> StepOutcome {
        let w0n = normalize_with_epsilon(query, self.epsilon);
        let mag = l2_norm(query);

        let mut t = vec![0.0f32; query.len()];
        for (&idx, &w) in neighbors.indices.iter().zip(&neighbors.weights) {
            // Corrupted rows carry their neutralized weight but no direction.
            let row = table
                .normalized_row(idx)
                .filter(|row| row.iter().all(|x| x.is_finite()));
            if let Some(row) = row {
                for (acc, x) in t.iter_mut().zip(row) {
                    *acc += w * x;
                }
            }
        }
        let along = dot(&t, &w0n);
        let t = add_scaled(&t, &w0n, -along);
        let nt = l2_norm(&t);

        if !(nt >= self.epsilon) {
            trace!(tangent_norm = nt, "Degenerate consensus direction, step skipped");
            return StepOutcome {
                vector: query.to_vec(),
                angle_deg: 0.0,
                capped: false,
                degenerate: true,
            };
        }

        let t = scale(&t, 1.0 / (nt + self.epsilon));
        let mut w_star = add_scaled(query, &t, step_scale * mag);

        let angle = angle_between_deg(query, &w_star);
        let capped = angle > theta_max_deg;
        if capped {
            let displacement = sub(&w_star, query);
            let factor = trust_region_factor(query, &displacement, theta_max_deg);
            w_star = add_scaled(query, &displacement, factor);
        }

        let vector = with_magnitude(&w_star, mag);
        let angle_deg = angle_between_deg(query, &vector);
        StepOutcome {
            vector,
            angle_deg,
            capped,
            degenerate: false,
        }
    }
}
