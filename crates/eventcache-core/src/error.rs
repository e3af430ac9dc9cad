use thiserror::Error;

use crate::api::TransportError;

/// Errors surfaced by the query cache.
///
/// These are stored in cache entries and mutation records and read back
/// through status fields; they are never raised across a subscription.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Malformed query key: {0}")]
    Encoding(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Cache consistency violation: {0}")]
    CacheConsistency(String),
}

impl QueryError {
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            QueryError::Transport(err) => Some(err),
            _ => None,
        }
    }

    /// Message to show an end user: the backend's `info.message` when present,
    /// otherwise the provided fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        self.as_transport()
            .and_then(TransportError::info_message)
            .unwrap_or(fallback)
            .to_string()
    }
}
