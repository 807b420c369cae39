use serde_json::Value;
use thiserror::Error;

/// Fallback message when the backend gives no usable `detail`.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Error returned by every backend call.
/// Callers branch on `is_payment_required()` to tell the usage gate apart
/// from ordinary failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status {
        status: u16,
        message: String,
        data: Option<Value>,
    },

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Could not read upload: {0}")]
    Upload(#[from] std::io::Error),
}

impl ApiError {
    /// Builds a status error from a raw response body.
    /// A body that is not JSON yields `data: None` and the fallback message.
    pub fn from_body(status: u16, body: &[u8], fallback: &str) -> Self {
        let data = serde_json::from_slice::<Value>(body).ok();
        let message = data
            .as_ref()
            .and_then(detail_message)
            .unwrap_or_else(|| fallback.to_string());
        ApiError::Status {
            status,
            message,
            data,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// HTTP 402: the server-side usage gate refused the action.
    pub fn is_payment_required(&self) -> bool {
        self.status() == Some(402)
    }
}

/// Extracts `detail` (string) or `detail.message` (object) from an error body.
fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail_becomes_message() {
        let err = ApiError::from_body(404, br#"{"detail":"Letter not found"}"#, DEFAULT_ERROR_MESSAGE);
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("Letter not found"));
    }

    #[test]
    fn test_object_detail_uses_nested_message() {
        let body = br#"{"detail":{"message":"You've used all your free AI uses.","free_uses_remaining":0}}"#;
        let err = ApiError::from_body(402, body, DEFAULT_ERROR_MESSAGE);
        assert!(err.is_payment_required());
        match err {
            ApiError::Status { message, data, .. } => {
                assert_eq!(message, "You've used all your free AI uses.");
                assert_eq!(data.unwrap()["detail"]["free_uses_remaining"], 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_falls_back_quietly() {
        let err = ApiError::from_body(502, b"<html>Bad gateway</html>", DEFAULT_ERROR_MESSAGE);
        match err {
            ApiError::Status { message, data, .. } => {
                assert_eq!(message, "An error occurred");
                assert!(data.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_fallback_message() {
        let err = ApiError::from_body(500, b"", "Export failed");
        assert!(err.to_string().contains("Export failed"));
        assert!(!err.is_payment_required());
    }
}
