use thiserror::Error;

/// Errors produced when constructing or parsing core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{field} must not be empty")]
    EmptyId { field: &'static str },

    #[error("{field} exceeds {max} characters")]
    IdTooLong { field: &'static str, max: usize },

    #[error("unknown order status: {0}")]
    UnknownStatus(String),

    #[error("invalid {field}: {reason}")]
    InvalidAmount { field: &'static str, reason: String },
}
