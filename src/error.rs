//! Error types for the FreeKassa client library.

use thiserror::Error;

/// The main error type for all FreeKassa client operations.
#[derive(Error, Debug)]
pub enum FreekassaError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// Nonce storage I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The gateway rejected the request
    #[error("FreeKassa API error: {0}")]
    Api(ApiError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request could not be assembled or signed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A rejection returned by the FreeKassa API in the response body.
///
/// The gateway answers with `{"type": "error", ...}` when it refuses a request.
/// Only the `type` field is guaranteed; `message` is filled in when the gateway
/// includes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Value of the response `type` field (anything other than `"success"`).
    pub kind: String,
    /// Human-readable message, if the gateway sent one.
    pub message: Option<String>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(kind: impl Into<String>, message: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            message,
        }
    }

    /// Build an API error from a raw response body.
    ///
    /// Missing `type` is reported as `"unknown"`.
    pub fn from_body(body: &serde_json::Value) -> Self {
        let kind = body
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let message = body
            .get("message")
            .or_else(|| body.get("msg"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self { kind, message }
    }

    /// Check if the gateway complained about the signature.
    pub fn is_invalid_signature(&self) -> bool {
        self.message_contains("signature")
    }

    /// Check if the gateway complained about the nonce.
    pub fn is_invalid_nonce(&self) -> bool {
        self.message_contains("nonce")
    }

    fn message_contains(&self, needle: &str) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains(needle))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}: request rejected, try checking arguments", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_body() {
        let body = serde_json::json!({"type": "error", "message": "Wrong nonce"});
        let error = ApiError::from_body(&body);
        assert_eq!(error.kind, "error");
        assert_eq!(error.message.as_deref(), Some("Wrong nonce"));
        assert!(error.is_invalid_nonce());
        assert!(!error.is_invalid_signature());
    }

    #[test]
    fn test_api_error_without_message() {
        let body = serde_json::json!({"type": "error"});
        let error = ApiError::from_body(&body);
        assert_eq!(error.message, None);
        assert_eq!(
            error.to_string(),
            "error: request rejected, try checking arguments"
        );
    }

    #[test]
    fn test_api_error_missing_type() {
        let error = ApiError::from_body(&serde_json::json!({}));
        assert_eq!(error.kind, "unknown");
    }
}
