/// Errors produced by classifiers.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The classifier could not be reached or did not answer in time.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// The classifier answered with something that is not an assessment.
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}

/// Result alias for classifier operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;
