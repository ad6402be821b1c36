//! Error types shared by the export surfaces.
//!
//! Nothing here is retried automatically. Each variant maps to one way of
//! reporting the problem back to the user.

use thiserror::Error;

/// A failed call against the Trello REST API.
///
/// `status` is `None` when the request never produced an HTTP response
/// (connection refused, timeout) or the success body could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe_remote(.status, .body))]
pub struct RemoteError {
    pub status: Option<u16>,
    pub body: String,
}

fn describe_remote(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("API call failed ({}): {}", code, body),
        None => format!("API call failed: {}", body),
    }
}

impl RemoteError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            body: reason.into(),
        }
    }
}

/// Persisted state could not be read or written.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("state store lock poisoned")]
    Poisoned,
}

/// A feed entry lacked the structure needed to build an item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot extract item {key}: {reason}")]
pub struct ExtractionError {
    pub key: String,
    pub reason: String,
}

/// The broker behind the message bridge is gone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("connection to the export service was lost")]
pub struct ConnectivityError;

/// Failures that abort a whole export call.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Trello API not configured. Please set up your credentials first.")]
    Config,

    #[error(transparent)]
    Store(#[from] StoreError),
}
