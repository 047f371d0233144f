//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{AssessmentStateError, StoryStateError};

/// Errors emitted by a `StudyApi` implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {status}")]
    Status {
        status: reqwest::StatusCode,
        /// The `error` field of the response body, when the server sent one.
        message: Option<String>,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("base url {base} cannot hold path segments")]
    InvalidEndpoint { base: String },
}

impl ApiError {
    /// Human-readable message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Errors emitted by `AssessmentSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error(transparent)]
    State(#[from] AssessmentStateError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StorySession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoryError {
    #[error(transparent)]
    State(#[from] StoryStateError),
    /// A remote call failed. `message` is the server's explanation or a
    /// fixed fallback for the operation.
    #[error("{message}")]
    Remote {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API base URL: {raw}")]
    InvalidBaseUrl { raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
