//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Every variant knows which HTTP status it is reported with.

use reqwest::StatusCode;
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const QUOTA_EXHAUSTED_MESSAGE: &str = "API credits exhausted. Please add credits.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("{}", QUOTA_EXHAUSTED_MESSAGE)]
    QuotaExhausted,

    #[error("{0}")]
    Upstream(String),

    /// Failure reported by a remote identification endpoint.
    #[error("{message}")]
    Remote { status: StatusCode, message: String },

    #[error("Image size must be less than 10MB")]
    ImageTooLarge { size: u64 },
}

impl Error {
    /// Maps a non-success AI gateway status onto the error taxonomy.
    pub fn from_gateway_status(status: StatusCode, body: &str) -> Self {
        tracing::error!("AI gateway error (status {}): {}", status, body);
        match status {
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
            StatusCode::PAYMENT_REQUIRED => Error::QuotaExhausted,
            _ => Error::Upstream(format!("AI gateway error: {}", status.as_u16())),
        }
    }

    /// HTTP status this error is reported with.
    ///
    /// Missing input is deliberately a 500, matching the deployed function.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
            Error::Remote { status, .. } => *status,
            Error::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Io(_)
            | Error::Serialization(_)
            | Error::Http(_)
            | Error::Configuration(_)
            | Error::InvalidInput(_)
            | Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure came back from the identify function rather than the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote { .. })
    }

    pub fn remote_status(&self) -> Option<StatusCode> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
