//! Error types for relaymesh-reconcile

use thiserror::Error;

/// Result type alias using relaymesh-reconcile's Error type
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors ending a site's pipeline or the whole run
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Loading, normalizing or planning the site failed
    #[error(transparent)]
    Specification(#[from] relaymesh_core::Error),

    /// A management API call failed
    #[error(transparent)]
    Api(#[from] relaymesh_broker::ApiError),

    /// The definitions document could not be written
    #[error("Failed to write {path}: {source}")]
    Emit {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The definitions document could not be serialized
    #[error("Failed to serialize definitions for site '{site}': {source}")]
    Serialize {
        site: String,
        #[source]
        source: serde_json::Error,
    },

    /// The blocking task writing the definitions document did not complete
    #[error("Definitions task for site '{site}' failed: {source}")]
    Blocking {
        site: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ReconcileError {
    pub fn emit(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Emit {
            path: path.into(),
            source,
        }
    }

    pub fn blocking(site: impl Into<String>, source: tokio::task::JoinError) -> Self {
        Self::Blocking {
            site: site.into(),
            source,
        }
    }
}
