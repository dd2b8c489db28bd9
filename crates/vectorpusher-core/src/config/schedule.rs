//! Strength-to-schedule interpolation endpoints.

use serde::{Deserialize, Serialize};

/// Linear range `[at_zero, at_one]` sampled by strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRange {
    /// Value at strength 0.
    pub at_zero: f32,
    /// Value at strength 1.
    pub at_one: f32,
}

impl LinearRange {
    /// Create a range.
    pub const fn new(at_zero: f32, at_one: f32) -> Self {
        Self { at_zero, at_one }
    }

    /// `at_zero + (at_one - at_zero) * s`
    pub fn at(&self, s: f32) -> f32 {
        self.at_zero + (self.at_one - self.at_zero) * s
    }
}

/// Endpoints for mapping strength onto the four schedule parameters.
///
/// Defaults reproduce `k = round(8 + 12s)`, `tau = 6 + 6s`,
/// `step_scale = 0.06 + 0.14s`, `theta_max_deg = 8 + 12s`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Neighbor count range (rounded half-to-even).
    pub k: LinearRange,
    /// Softmax temperature range.
    pub tau: LinearRange,
    /// Step scale range, relative to the query magnitude.
    pub step_scale: LinearRange,
    /// Trust-region angle cap range, in degrees.
    pub theta_max_deg: LinearRange,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            k: LinearRange::new(8.0, 20.0),
            tau: LinearRange::new(6.0, 12.0),
            step_scale: LinearRange::new(0.06, 0.20),
            theta_max_deg: LinearRange::new(8.0, 20.0),
        }
    }
}

impl ScheduleConfig {
    /// Validate the schedule endpoints.
    pub fn validate(&self) -> Result<(), String> {
        let ranges = [
            ("k", self.k),
            ("tau", self.tau),
            ("step_scale", self.step_scale),
            ("theta_max_deg", self.theta_max_deg),
        ];
        for (name, range) in ranges {
            if !(range.at_zero.is_finite() && range.at_one.is_finite()) {
                return Err(format!("{} endpoints must be finite", name));
            }
            if range.at_zero <= 0.0 || range.at_one <= 0.0 {
                return Err(format!(
                    "{} endpoints must be > 0, got [{}, {}]",
                    name, range.at_zero, range.at_one
                ));
            }
        }
        if self.k.at_zero < 1.0 {
            return Err(format!("k.at_zero must be >= 1, got {}", self.k.at_zero));
        }
        if self.step_scale.at_zero > 1.0 || self.step_scale.at_one > 1.0 {
            return Err("step_scale endpoints must be <= 1".to_string());
        }
        if self.theta_max_deg.at_zero > 180.0 || self.theta_max_deg.at_one > 180.0 {
            return Err("theta_max_deg endpoints must be <= 180".to_string());
        }
        Ok(())
    }
}
