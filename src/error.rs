// Error types for the Mockaroo client.
//
// Every operation returns `ClientError` on failure. Service failures keep
// the numeric status and the raw body so callers can tell quota exhaustion
// apart from a bad schema name.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable API key was configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// Upload rejected locally because of the file extension.
    #[error("unsupported file type '{extension}' for {path} (expected .csv or .txt)")]
    UnsupportedFileType { path: PathBuf, extension: String },

    /// A generate request that can't be sent as-is.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP round trip could not complete.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-2xx status.
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A successful response whose body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns the service error when the failure came from the remote side.
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }

    /// True when the service reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        self.as_service()
            .map(|err| err.kind() == ServiceErrorKind::NotFound)
            .unwrap_or(false)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// A non-2xx answer from the service, body kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub status: u16,
    pub body: String,
}

/// Coarse classification of service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    InvalidApiKey,
    UsageLimitExceeded,
    NotFound,
    Other,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ServiceError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The `error` member of a JSON error body, if the service sent one.
    pub fn error_text(&self) -> Option<String> {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.error)
    }

    /// Human readable message: the `error` member or the raw body.
    pub fn message(&self) -> String {
        self.error_text()
            .unwrap_or_else(|| self.body.trim().to_string())
    }

    pub fn kind(&self) -> ServiceErrorKind {
        if self.status == 404 {
            return ServiceErrorKind::NotFound;
        }
        let text = self.error_text().unwrap_or_default();
        let lowered = text.to_lowercase();
        if text == "Invalid API Key" || self.status == 401 {
            ServiceErrorKind::InvalidApiKey
        } else if mentions_quota(&lowered) {
            ServiceErrorKind::UsageLimitExceeded
        } else if lowered.contains("not found") {
            ServiceErrorKind::NotFound
        } else {
            ServiceErrorKind::Other
        }
    }
}

/// Whole-word "limited" or the phrase "limit exceeded", so names such as
/// `unlimited_users` don't count.
fn mentions_quota(lowered: &str) -> bool {
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .collect();
    words.iter().any(|w| *w == "limited")
        || words.windows(2).any(|pair| *pair == ["limit", "exceeded"])
}

impl std::error::Error for ServiceError {}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.trim().is_empty() {
            write!(f, "service returned status {}", self.status)
        } else {
            write!(f, "service returned status {}: {}", self.status, self.body.trim())
        }
    }
}
