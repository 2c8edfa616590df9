//! Error types for relaymesh-core

use thiserror::Error;

use crate::types::Category;

/// Result type alias using relaymesh-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, normalizing and compiling site specifications
#[derive(Error, Debug)]
pub enum Error {
    /// A specification file or directory could not be read
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A specification document is structurally malformed
    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// A category block satisfies neither supported shape
    #[error("Category '{category}' is invalid: {message}")]
    Schema { category: String, message: String },

    /// A category the topology depends on is absent from the specification
    #[error("Category '{category}' is missing from the specification")]
    MissingCategory { category: Category },

    /// A relay endpoint could not be derived for a category
    #[error("Cannot resolve relay endpoint for '{category}': {message}")]
    EndpointResolution { category: Category, message: String },

    /// Runtime settings are invalid
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// YAML parsing error in a settings file
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Create a config read error
    pub fn config_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ConfigRead {
            path: path.into(),
            source,
        }
    }

    /// Create a config parse error
    pub fn config_parse(path: impl Into<String>, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a schema error for a category
    pub fn schema(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            category: category.into(),
            message: message.into(),
        }
    }

    /// Create a missing category error
    pub fn missing_category(category: Category) -> Self {
        Self::MissingCategory { category }
    }

    /// Create an endpoint resolution error
    pub fn endpoint_resolution(category: Category, message: impl Into<String>) -> Self {
        Self::EndpointResolution {
            category,
            message: message.into(),
        }
    }

    /// Create an invalid settings error
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }
}
