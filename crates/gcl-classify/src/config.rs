use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::fallback::FallbackClassifier;
use crate::heuristic::HeuristicClassifier;
use crate::model::{ModelClassifier, ModelConfig};
use crate::traits::Classifier;

/// Which classifier answers `/analyze`.
///
/// Without a `[classifier.model]` section only the keyword heuristic runs.
/// With one, the model answers first and the heuristic covers for it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model: Option<ModelConfig>,
}

impl ClassifierConfig {
    pub fn build(&self) -> Arc<dyn Classifier> {
        match &self.model {
            Some(model) => {
                let primary = ModelClassifier::from_env(model.clone());
                if primary.has_api_key() {
                    info!(model = %model.model, url = %model.api_url, "classifying with model");
                } else {
                    warn!(
                        env = %model.api_key_env,
                        "model API key not set, every request will use the keyword fallback"
                    );
                }
                Arc::new(FallbackClassifier::new(primary).with_timeout(model.timeout()))
            }
            None => Arc::new(HeuristicClassifier::new()),
        }
    }
}
