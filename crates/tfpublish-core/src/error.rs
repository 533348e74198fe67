//! Errors that abort a publish run.
//!
//! Every variant is fatal. Nothing is retried; the registry state left behind
//! is converged by running again.

use std::path::PathBuf;

use thiserror::Error;
use tfpublish_schema::SchemaError;

/// Failure of a publish run.
#[derive(Error, Debug)]
pub enum PublishError {
    /// A required input is missing or empty.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The release directory does not describe a provider release.
    #[error("{0}")]
    Discovery(String),

    /// The registry answered with a status the operation does not accept.
    #[error("Invalid response code {status} from {operation}")]
    Registry {
        /// Registry call that failed, e.g. `create provider`.
        operation: &'static str,
        /// HTTP status returned.
        status: u16,
    },

    /// A file could not be transferred to its pre-signed URL.
    #[error("Upload of {} failed: {message}", path.display())]
    Upload {
        /// Local file being sent.
        path: PathBuf,
        /// Why the transfer failed.
        message: String,
    },

    /// Transport failure talking to the registry or an upload URL.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the release directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A registry response or request body did not match its JSON:API shape.
    #[error("Invalid JSON in {context}: {source}")]
    Json {
        /// Operation or file the JSON belongs to.
        context: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

impl PublishError {
    pub(crate) fn discovery(msg: impl std::fmt::Display) -> Self {
        Self::Discovery(msg.to_string())
    }

    pub(crate) fn json(context: impl std::fmt::Display, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.to_string(),
            source,
        }
    }

    pub(crate) fn upload(path: impl Into<PathBuf>, msg: impl std::fmt::Display) -> Self {
        Self::Upload {
            path: path.into(),
            message: msg.to_string(),
        }
    }
}

impl From<SchemaError> for PublishError {
    fn from(err: SchemaError) -> Self {
        Self::Discovery(err.to_string())
    }
}
