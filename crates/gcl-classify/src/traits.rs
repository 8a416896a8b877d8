use async_trait::async_trait;

use crate::assessment::Assessment;
use crate::error::ClassifyResult;

/// Anything that can judge how sustainable a product is from its text.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> ClassifyResult<Assessment>;
}
