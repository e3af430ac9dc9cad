use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload the backend attaches to error responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: Option<String>,
}

/// Broad category of a transport failure, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    AccessDenied,
    Unauthorized,
    NotFound,
    Validation,
    RateLimited,
    Server,
    Network,
    Cancelled,
    InvalidResponse,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// HTTP status code, when the server answered at all.
    pub code: Option<u16>,
    pub message: String,
    pub info: Option<ErrorInfo>,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            info: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "Request cancelled")
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidResponse, message)
    }

    /// Attach a backend-provided message that should be shown to the user as is.
    pub fn with_info_message(mut self, message: impl Into<String>) -> Self {
        self.info = Some(ErrorInfo {
            message: Some(message.into()),
        });
        self
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        let (kind, message) = match status {
            401 => (
                TransportErrorKind::Unauthorized,
                "Unauthorized - token may be expired".to_string(),
            ),
            403 => (TransportErrorKind::AccessDenied, format!("Access denied: {}", truncated)),
            404 => (TransportErrorKind::NotFound, format!("Resource not found: {}", truncated)),
            400 | 422 => (TransportErrorKind::Validation, format!("Rejected input: {}", truncated)),
            429 => (
                TransportErrorKind::RateLimited,
                "Rate limited - please wait before retrying".to_string(),
            ),
            500..=599 => (TransportErrorKind::Server, format!("Server error: {}", truncated)),
            _ => (
                TransportErrorKind::InvalidResponse,
                format!("Status {}: {}", status, truncated),
            ),
        };

        // The backend answers failures with `{ "message": "..." }`.
        let info = serde_json::from_str::<ErrorInfo>(body)
            .ok()
            .filter(|info| info.message.is_some());

        Self {
            kind,
            code: Some(status),
            message,
            info,
        }
    }

    /// The message meant for end users, when the backend supplied one.
    pub fn info_message(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.message.as_deref())
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == TransportErrorKind::Cancelled
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::invalid_response(format!("Failed to parse response: {}", err));
        }
        let mut mapped = Self::network(format!("Network error: {}", err));
        mapped.code = err.status().map(|s| s.as_u16());
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_parses_info_message() {
        let err = TransportError::from_status(422, r#"{"message":"Invalid data provided."}"#);
        assert_eq!(err.kind, TransportErrorKind::Validation);
        assert_eq!(err.code, Some(422));
        assert_eq!(err.info_message(), Some("Invalid data provided."));
    }

    #[test]
    fn test_from_status_plain_body_has_no_info() {
        let err = TransportError::from_status(500, "boom");
        assert_eq!(err.kind, TransportErrorKind::Server);
        assert!(err.info.is_none());
        assert_eq!(err.to_string(), "Server error: boom");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let err = TransportError::from_status(404, &body);
        assert!(err.message.contains("truncated"));
    }
}
