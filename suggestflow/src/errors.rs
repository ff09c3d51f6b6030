//! Error types for suggestflow.
//!
//! Per-task failures are carried as [`CrawlError`] values and consumed by the
//! worker loop, which logs them under their [`ErrorKind`] and moves on. Only
//! configuration and output initialization failures abort a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for suggestflow operations.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The run configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The provider could not be reached.
    #[error("Transport error for '{query}': {message}")]
    Transport {
        /// The query being looked up.
        query: String,
        /// Underlying transport message.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("HTTP {status} for '{query}'")]
    HttpStatus {
        /// The query being looked up.
        query: String,
        /// The returned status code.
        status: u16,
    },

    /// The provider answered with a body that is not a suggestion document.
    #[error("Malformed response for '{query}': {message}")]
    MalformedResponse {
        /// The query being looked up.
        query: String,
        /// What was wrong with the body.
        message: String,
    },

    /// Writing a record to the result sink failed.
    #[error("Sink error: {0}")]
    Sink(String),

    /// A task panicked while being processed.
    #[error("Task panicked while processing '{query}': {message}")]
    TaskPanicked {
        /// The query of the panicking task.
        query: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Returns the stable kind label for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Sink(_) => ErrorKind::Sink,
            Self::TaskPanicked { .. } => ErrorKind::TaskPanicked,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether this error came from the suggestion lookup itself.
    ///
    /// Lookup errors are recovered by treating the lookup as empty.
    #[must_use]
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::MalformedResponse { .. }
        )
    }
}

/// Stable classification of a [`CrawlError`], used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid configuration.
    Config,
    /// Network failure.
    Transport,
    /// Non-success HTTP status.
    HttpStatus,
    /// Unparseable provider payload.
    MalformedResponse,
    /// Result sink write failure.
    Sink,
    /// Panic during task processing.
    TaskPanicked,
    /// Internal failure.
    Internal,
    /// Filesystem failure.
    Io,
}

impl ErrorKind {
    /// Returns the label as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Transport => "transport",
            Self::HttpStatus => "http_status",
            Self::MalformedResponse => "malformed_response",
            Self::Sink => "sink",
            Self::TaskPanicked => "task_panicked",
            Self::Internal => "internal",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a configuration value is rejected.
#[derive(Debug, Clone, Error)]
#[error("Invalid configuration for '{field}': {message}")]
pub struct ConfigError {
    /// The offending field.
    pub field: String,
    /// Why the value was rejected.
    pub message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convenience result alias.
pub type CrawlResult<T> = Result<T, CrawlError>;
