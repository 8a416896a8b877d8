use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::assessment::Assessment;
use crate::error::{ClassifyError, ClassifyResult};
use crate::heuristic::HeuristicClassifier;
use crate::traits::Classifier;

/// Default time a primary classifier gets before the fallback answers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a primary classifier and answers with the keyword heuristic when
/// the primary fails, times out, or returns an out-of-range score.
///
/// Callers never see a classifier error through this type.
pub struct FallbackClassifier<P> {
    primary: P,
    fallback: HeuristicClassifier,
    timeout: Duration,
}

impl<P: Classifier> FallbackClassifier<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: HeuristicClassifier::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn try_primary(&self, text: &str) -> ClassifyResult<Assessment> {
        let assessment = tokio::time::timeout(self.timeout, self.primary.classify(text))
            .await
            .map_err(|_| {
                ClassifyError::Unavailable(format!("no answer within {:?}", self.timeout))
            })??;
        assessment.validate()?;
        Ok(assessment)
    }
}

#[async_trait]
impl<P: Classifier> Classifier for FallbackClassifier<P> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn classify(&self, text: &str) -> ClassifyResult<Assessment> {
        match self.try_primary(text).await {
            Ok(assessment) => Ok(assessment),
            Err(e) => {
                warn!(classifier = self.primary.name(), error = %e, "classifier failed, using keyword fallback");
                Ok(self.fallback.assess(text))
            }
        }
    }
}
