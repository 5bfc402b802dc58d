use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data (missing, empty, or malformed input)
    #[error("{message}")]
    BadRequest { message: String },

    /// Missing provider credential
    #[error("{message}")]
    Configuration { message: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error body rendered to clients: `{"detail": "..."}` with matching status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            // Configuration errors are not distinguished from other runtime
            // failures at the boundary.
            Error::Configuration { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message carried in the response body. Internal failures surface
    /// their full context chain as free text.
    pub fn detail(&self) -> String {
        match self {
            Error::BadRequest { message } | Error::Configuration { message } => message.clone(),
            Error::Other(err) => format!("{err:#}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Configuration { .. } => {
                tracing::error!("Configuration error: {}", self);
            }
            Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
        }

        (self.status_code(), Json(ErrorBody { detail: self.detail() })).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
