use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Score at or above which a purchase counts as sustainable.
pub const SUSTAINABLE_THRESHOLD: f64 = 5.0;

/// Credit points required per carbon reward.
pub const REWARD_THRESHOLD: f64 = 5.0;

/// Thresholds governing sustainability and carbon-reward derivation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Minimum sustainability score for a purchase to count as sustainable.
    pub sustainable_threshold: f64,
    /// Accumulated credit needed to unlock each carbon reward.
    pub reward_threshold: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            sustainable_threshold: SUSTAINABLE_THRESHOLD,
            reward_threshold: REWARD_THRESHOLD,
        }
    }
}

impl RewardPolicy {
    /// Reject thresholds that would make reward derivation meaningless.
    pub fn validate(&self) -> Result<(), TypeError> {
        if !self.sustainable_threshold.is_finite() {
            return Err(TypeError::InvalidAmount {
                field: "sustainable_threshold",
                reason: "must be finite".into(),
            });
        }
        if !(self.reward_threshold.is_finite() && self.reward_threshold > 0.0) {
            return Err(TypeError::InvalidAmount {
                field: "reward_threshold",
                reason: "must be a positive finite number".into(),
            });
        }
        Ok(())
    }

    /// A missing score is never sustainable.
    pub fn is_sustainable(&self, score: Option<f64>) -> bool {
        score.is_some_and(|s| s >= self.sustainable_threshold)
    }

    /// Number of rewards a credit total is worth, before ratcheting.
    pub fn rewards_for(&self, total_credit_score: f64) -> u32 {
        if total_credit_score <= 0.0 {
            return 0;
        }
        (total_credit_score / self.reward_threshold).floor() as u32
    }
}
