use std::fmt;

use gcl_types::Classification;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ClassifyResult};

/// Lowest score a classifier may report.
pub const MIN_SCORE: f64 = -10.0;

/// Highest score a classifier may report.
pub const MAX_SCORE: f64 = 10.0;

/// Letter grade derived from a numeric score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// A: 8 and up, B: 5 and up, C: 2 and up, D: 0 and up, F below zero.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::A
        } else if score >= 5.0 {
            Self::B
        } else if score >= 2.0 {
            Self::C
        } else if score >= 0.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classifier produced an assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Model,
    Fallback,
}

/// A classifier's verdict on one product text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Sustainability score in `[-10, 10]`.
    pub numeric_score: f64,
    pub grade: Grade,
    /// Material and eco-label keywords found in the text, sorted.
    pub materials: Vec<String>,
    pub explanation: String,
    /// Estimated kilograms of CO2 per item.
    pub carbon_footprint_kg: f64,
    /// Estimated litres of water per item.
    pub water_usage_liters: f64,
    #[serde(rename = "used")]
    pub source: Source,
}

impl Assessment {
    /// Reject scores outside the classifier range.
    pub fn validate(&self) -> ClassifyResult<()> {
        if !(self.numeric_score.is_finite()
            && (MIN_SCORE..=MAX_SCORE).contains(&self.numeric_score))
        {
            return Err(ClassifyError::InvalidResponse(format!(
                "numericScore {} outside [{MIN_SCORE}, {MAX_SCORE}]",
                self.numeric_score
            )));
        }
        Ok(())
    }

    /// Credit an order earns for this product: the score, floored at zero.
    pub fn credit_amount(&self) -> f64 {
        self.numeric_score.max(0.0)
    }

    /// Ledger classification for an order of this product.
    pub fn to_classification(&self, product_label: Option<String>) -> Classification {
        Classification {
            product_label,
            sustainability_score: Some(self.numeric_score),
            credit_amount: Some(self.credit_amount()),
        }
    }
}
