//! Strength-to-parameter schedule.
//!
//! A single strength `s` in `[0, 1]` picks the neighbor count, softmax
//! temperature, step scale and angular cap by fixed linear interpolation.

use serde::{Deserialize, Serialize};

use crate::config::ScheduleConfig;
use crate::error::{SculptError, SculptResult};

/// Parameters driving one sculpting pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Neighbor count.
    pub k: usize,
    /// Softmax temperature.
    pub tau: f32,
    /// Step length relative to the query magnitude, in `(0, 1]`.
    pub step_scale: f32,
    /// Maximum rotation per step, in degrees, in `(0, 180]`.
    pub theta_max_deg: f32,
}

impl Schedule {
    /// Schedule for `strength` with the default endpoints.
    ///
    /// # Example
    ///
    /// ```
    /// use vectorpusher_core::schedule::Schedule;
    ///
    /// let s = Schedule::from_strength(0.5);
    /// assert_eq!(s.k, 14);
    /// assert!((s.theta_max_deg - 14.0).abs() < 1e-5);
    /// ```
    pub fn from_strength(strength: f32) -> Self {
        ScheduleMapper::default().map(strength)
    }

    /// Apply any overrides present.
    pub fn with_overrides(mut self, overrides: &ScheduleOverrides) -> Self {
        if let Some(k) = overrides.k {
            self.k = k;
        }
        if let Some(tau) = overrides.tau {
            self.tau = tau;
        }
        if let Some(step_scale) = overrides.step_scale {
            self.step_scale = step_scale;
        }
        if let Some(theta) = overrides.theta_max_deg {
            self.theta_max_deg = theta;
        }
        self
    }

    /// Validate parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `SculptError::InvalidParameter` naming the first bad field.
    pub fn validate(&self) -> SculptResult<()> {
        if self.k == 0 {
            return Err(SculptError::invalid_param("k", self.k, "Must be >= 1"));
        }
        if !(self.tau > 0.0 && self.tau.is_finite()) {
            return Err(SculptError::invalid_param("tau", self.tau, "Must be finite and > 0"));
        }
        if !(self.step_scale > 0.0 && self.step_scale <= 1.0) {
            return Err(SculptError::invalid_param(
                "step_scale",
                self.step_scale,
                "Must be in (0, 1]",
            ));
        }
        if !(self.theta_max_deg > 0.0 && self.theta_max_deg <= 180.0) {
            return Err(SculptError::invalid_param(
                "theta_max_deg",
                self.theta_max_deg,
                "Must be in (0, 180]",
            ));
        }
        Ok(())
    }
}

/// Caller-supplied replacements for individual schedule parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOverrides {
    /// Neighbor count.
    #[serde(default)]
    pub k: Option<usize>,
    /// Softmax temperature.
    #[serde(default)]
    pub tau: Option<f32>,
    /// Step scale.
    #[serde(default)]
    pub step_scale: Option<f32>,
    /// Angular cap in degrees.
    #[serde(default)]
    pub theta_max_deg: Option<f32>,
}

impl ScheduleOverrides {
    /// Whether no parameter is overridden.
    pub fn is_empty(&self) -> bool {
        self.k.is_none()
            && self.tau.is_none()
            && self.step_scale.is_none()
            && self.theta_max_deg.is_none()
    }
}

/// Maps strength onto a [`Schedule`] using configured endpoints.
#[derive(Debug, Clone, Default)]
pub struct ScheduleMapper {
    config: ScheduleConfig,
}

impl ScheduleMapper {
    /// Create a mapper from schedule endpoints.
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// Interpolate the schedule for `strength`, clamped to `[0, 1]`.
    ///
    /// The neighbor count is rounded half-to-even.
    pub fn map(&self, strength: f32) -> Schedule {
        let s = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        let k = self.config.k.at(s).round_ties_even().max(1.0) as usize;
        Schedule {
            k,
            tau: self.config.tau.at(s),
            step_scale: self.config.step_scale.at(s),
            theta_max_deg: self.config.theta_max_deg.at(s),
        }
    }
}
