//! Deterministic keyword classifier.
//!
//! Scores product text by summing weights of the material and eco-label
//! keywords it mentions. Used on its own when no model is configured and as
//! the fallback whenever a model classifier fails.

use async_trait::async_trait;

use crate::assessment::{Assessment, Grade, Source, MAX_SCORE, MIN_SCORE};
use crate::error::ClassifyResult;
use crate::traits::Classifier;

/// Keywords reported back as detected materials.
const MATERIALS: &[&str] = &[
    // textiles and natural fibers
    "cotton",
    "organic cotton",
    "egyptian cotton",
    "bamboo",
    "hemp",
    "linen",
    "jute",
    "wool",
    "silk",
    // synthetics
    "polyester",
    "microfiber",
    "nylon",
    "acrylic",
    "viscose",
    // materials and packaging
    "plastic",
    "recycled plastic",
    "recycled polyester",
    "rubber",
    "latex",
    "leather",
    "metal",
    "steel",
    "aluminum",
    "glass",
    // eco labels
    "recycled",
    "biodegradable",
    "compostable",
    "eco-friendly",
    "sustainable",
];

/// Score contribution of each keyword found in the text.
const WEIGHTS: &[(&str, i32)] = &[
    ("organic cotton", 4),
    ("bamboo", 4),
    ("hemp", 4),
    ("linen", 3),
    ("jute", 3),
    ("recycled", 3),
    ("recycled plastic", 2),
    ("recycled polyester", 1),
    ("biodegradable", 3),
    ("compostable", 3),
    ("eco-friendly", 2),
    ("sustainable", 2),
    ("cotton", 2),
    ("egyptian cotton", 2),
    ("wool", 1),
    ("silk", 1),
    ("polyester", -3),
    ("microfiber", -3),
    ("nylon", -3),
    ("acrylic", -3),
    ("viscose", -2),
    ("plastic", -3),
    ("rubber", -1),
    ("latex", -1),
    ("leather", -2),
];

/// Bonus for "recycled" when it never qualifies a following word.
const BARE_RECYCLED_BONUS: i32 = 2;

const POSITIVE_HINTS: &[&str] = &["bamboo", "hemp", "organic", "recycled", "compostable", "biodegradable"];
const NEGATIVE_HINTS: &[&str] = &["plastic", "polyester", "nylon", "synthetic"];

/// Keyword-weight classifier. Never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Assess `text` synchronously.
    pub fn assess(&self, text: &str) -> Assessment {
        let lower = text.to_lowercase();
        let materials = detect_materials(&lower);
        let score = f64::from(score(&lower));
        let (carbon_footprint_kg, water_usage_liters) = estimate_footprint(score);

        Assessment {
            numeric_score: score,
            grade: Grade::from_score(score),
            explanation: explain(&materials, score),
            carbon_footprint_kg,
            water_usage_liters,
            materials,
            source: Source::Fallback,
        }
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn classify(&self, text: &str) -> ClassifyResult<Assessment> {
        Ok(self.assess(text))
    }
}

/// Per-item carbon (kg) and water (litres) estimates scaled by how far the
/// score is from neutral.
pub(crate) fn estimate_footprint(score: f64) -> (f64, f64) {
    (
        (score.abs() * 0.8 + 1.0).clamp(0.2, 12.0),
        (score.abs() * 150.0 + 200.0).clamp(50.0, 3000.0),
    )
}

fn detect_materials(lower: &str) -> Vec<String> {
    let mut found: Vec<String> = MATERIALS
        .iter()
        .filter(|m| lower.contains(*m))
        .map(|m| m.to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

fn score(lower: &str) -> i32 {
    let mut score: i32 = WEIGHTS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, weight)| weight)
        .sum();
    if lower.contains("recycled") && !lower.contains("recycled ") {
        score += BARE_RECYCLED_BONUS;
    }
    score.clamp(MIN_SCORE as i32, MAX_SCORE as i32)
}

fn explain(materials: &[String], score: f64) -> String {
    let mut parts = Vec::new();
    if !materials.is_empty() {
        parts.push(format!("Detected materials/keywords: {}.", materials.join(", ")));
    }

    let verdict = match Grade::from_score(score) {
        Grade::A => "Overall this product appears highly eco-friendly based on the detected terms.",
        Grade::B => "Overall this product shows good sustainability characteristics.",
        Grade::C => "This product has a mix of positive and neutral sustainability traits.",
        Grade::D => "This product has mixed or unclear sustainability signals.",
        Grade::F => "This product likely has notable environmental drawbacks.",
    };
    parts.push(verdict.to_string());

    let joined = materials.join(" ");
    if POSITIVE_HINTS.iter().any(|h| joined.contains(h)) {
        parts.push("The presence of natural or recycled materials is a positive sign.".into());
    }
    if NEGATIVE_HINTS.iter().any(|h| joined.contains(h)) {
        parts.push(
            "However, plastic or synthetic components can increase carbon footprint and reduce recyclability."
                .into(),
        );
    }
    parts.join(" ")
}
