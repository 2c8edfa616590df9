//! Error types for relaymesh-broker

use thiserror::Error;

/// Result type alias using relaymesh-broker's Error type
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by management API operations
#[derive(Error, Debug)]
pub enum ApiError {
    /// The management API base URL cannot address API endpoints
    #[error("Invalid management API URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The broker rejected the credentials; never retried
    #[error("Management API refused {object} (HTTP {status}): check the administrative credentials")]
    Rejected { object: String, status: u16 },

    /// A call kept failing until the retry ceiling was reached
    #[error("Failed to reconcile {object} after {attempts} attempt(s): {message}")]
    Reconciliation {
        object: String,
        status: Option<u16>,
        attempts: u32,
        message: String,
    },
}

impl ApiError {
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn reconciliation(
        object: impl Into<String>,
        status: Option<u16>,
        attempts: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::Reconciliation {
            object: object.into(),
            status,
            attempts,
            message: message.into(),
        }
    }

    /// HTTP status of the last failed call, if the broker answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Reconciliation { status, .. } => *status,
            _ => None,
        }
    }

    /// Broker object the failing call addressed
    pub fn object(&self) -> Option<&str> {
        match self {
            Self::Rejected { object, .. } | Self::Reconciliation { object, .. } => Some(object),
            _ => None,
        }
    }
}
