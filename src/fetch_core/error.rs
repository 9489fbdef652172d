//! Error kinds raised while building queries and fetching pages
//!
//! Cursor exhaustion and unresolvable nodes are not errors: pagination simply
//! ends, and nodes without a usable timestamp are skipped with a log line.

#[derive(Debug)]
pub enum FetchError {
    /// Month token did not parse as `YYYY-MM`
    InvalidWindowToken(String),
    /// Non-success status or transport failure on a committed request
    RemoteFetchFailed {
        status: Option<u16>,
        message: String,
    },
    /// Response body was not a JSON document we can walk
    MalformedPayload(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RemoteFetchFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::RemoteFetchFailed {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedPayload(err.to_string())
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidWindowToken(token) => {
                write!(f, "Invalid month token '{}' (expected YYYY-MM)", token)
            }
            FetchError::RemoteFetchFailed { status: Some(code), message } => {
                write!(f, "Remote fetch failed with status {}: {}", code, message)
            }
            FetchError::RemoteFetchFailed { status: None, message } => {
                write!(f, "Remote fetch failed: {}", message)
            }
            FetchError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}
