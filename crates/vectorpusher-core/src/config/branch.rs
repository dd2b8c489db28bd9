//! Per-branch strength scaling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Strength multipliers keyed by branch name.
///
/// Branch names are matched case-insensitively. Branches without an entry
/// use `default_multiplier`. The scaled strength is clamped to `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Multiplier for branches not listed in `multipliers`.
    pub default_multiplier: f32,
    /// Lower-cased branch name to strength multiplier.
    pub multipliers: BTreeMap<String, f32>,
}

impl Default for BranchConfig {
    fn default() -> Self {
        let mut multipliers = BTreeMap::new();
        multipliers.insert("g".to_string(), 1.3);
        Self {
            default_multiplier: 1.0,
            multipliers,
        }
    }
}

impl BranchConfig {
    /// Multiplier for `branch`.
    pub fn multiplier(&self, branch: &str) -> f32 {
        self.multipliers
            .get(&branch.to_lowercase())
            .copied()
            .unwrap_or(self.default_multiplier)
    }

    /// Strength for `branch`: `min(1, strength * multiplier)`, floored at 0.
    pub fn branch_strength(&self, branch: &str, strength: f32) -> f32 {
        (strength * self.multiplier(branch)).clamp(0.0, 1.0)
    }

    /// Validate the branch configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.default_multiplier >= 0.0 && self.default_multiplier.is_finite()) {
            return Err(format!(
                "default_multiplier must be finite and >= 0, got {}",
                self.default_multiplier
            ));
        }
        for (name, m) in &self.multipliers {
            if !(*m >= 0.0 && m.is_finite()) {
                return Err(format!(
                    "multiplier for branch '{}' must be finite and >= 0, got {}",
                    name, m
                ));
            }
            if name.to_lowercase() != *name {
                return Err(format!("branch name '{}' must be lower-case", name));
            }
        }
        Ok(())
    }
}
