use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gcl_ledger::LedgerError;
use gcl_store::StoreError;
use gcl_types::TypeError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    /// The request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(e) => match e {
                LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
                LedgerError::OwnerMismatch { .. } => StatusCode::CONFLICT,
                LedgerError::UserNotFound(_) | LedgerError::OrderNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                LedgerError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidInput(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
