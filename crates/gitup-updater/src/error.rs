//! Error types for the update checker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur outside of a single remote tag check.
///
/// Tag fetch failures are not part of this enum: they are absorbed by the
/// engine and routed to the error log (see [`FetchError`]).
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Inventory could not be read or decoded
    #[error("inventory error: {0}")]
    InventoryError(String),

    /// Option store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        UpdateError::HttpError(err.to_string())
    }
}

impl From<toml::de::Error> for UpdateError {
    fn from(err: toml::de::Error) -> Self {
        UpdateError::ConfigError(err.to_string())
    }
}

/// Errors raised by an [`OptionStore`](crate::store::OptionStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read option store {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write option store {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("option store {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("failed to lock option store {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode option {key}: {message}")]
    Encode { key: String, message: String },

    #[error("option store lock poisoned")]
    Poisoned,
}

/// What went wrong with a single tag listing request.
///
/// This is the raw detail kept in the error log, so it is serializable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFailure {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The host answered with something other than 200 OK.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16, body: String },

    /// The repository reference could not be turned into an API endpoint.
    #[error("invalid repository reference: {message}")]
    InvalidReference { message: String },
}

impl FetchFailure {
    /// HTTP status code, if the host responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// A failed tag listing request.
#[derive(Debug, Clone, Error)]
#[error("tag request for {target} failed: {failure}")]
pub struct FetchError {
    /// Endpoint that was requested, or the raw reference when no endpoint
    /// could be derived.
    pub target: String,
    /// When the failure was observed.
    pub occurred_at: DateTime<Utc>,
    pub failure: FetchFailure,
}

impl FetchError {
    pub fn new(target: impl Into<String>, failure: FetchFailure) -> Self {
        Self {
            target: target.into(),
            occurred_at: Utc::now(),
            failure,
        }
    }

    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            target,
            FetchFailure::Transport {
                message: message.into(),
            },
        )
    }

    pub fn status(target: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::new(
            target,
            FetchFailure::Status {
                status,
                body: body.into(),
            },
        )
    }

    pub fn invalid_reference(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            target,
            FetchFailure::InvalidReference {
                message: message.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_accessors() {
        let failure = FetchFailure::Status {
            status: 404,
            body: "{\"message\":\"Not Found\"}".to_string(),
        };
        assert_eq!(failure.status(), Some(404));
        assert_eq!(failure.body(), Some("{\"message\":\"Not Found\"}"));

        let failure = FetchFailure::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(failure.status(), None);
        assert_eq!(failure.body(), None);
    }

    #[test]
    fn test_fetch_failure_serialization_is_tagged() {
        let failure = FetchFailure::Status {
            status: 500,
            body: "oops".to_string(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(json["status"], 500);
        assert_eq!(json["body"], "oops");
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::status("https://api.github.com/repos/o/r/tags", 403, "");
        assert_eq!(
            err.to_string(),
            "tag request for https://api.github.com/repos/o/r/tags failed: unexpected HTTP status 403"
        );
    }
}
