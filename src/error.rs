use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CloudError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid format: {0}")]
    FormatError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server responded with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),
}

impl CloudError {
    /// Classify a non-success HTTP status returned by the transport.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => CloudError::NotFound(body),
            _ => CloudError::Http { status, body },
        }
    }
}

impl From<serde_json::Error> for CloudError {
    fn from(err: serde_json::Error) -> Self {
        CloudError::FormatError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        not_found = { 404, "NotFound" },
        conflict = { 409, "Http" },
        unauthorized = { 401, "Http" },
        server_error = { 503, "Http" },
    )]
    fn test_from_status(status: u16, expected: &str) {
        let err = CloudError::from_status(status, "{}");
        let kind = match err {
            CloudError::NotFound(_) => "NotFound",
            CloudError::Http { .. } => "Http",
            _ => "other",
        };
        assert_eq!(kind, expected);
    }

    #[test]
    fn test_json_error_is_format_error() {
        let err: CloudError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, CloudError::FormatError(_)));
    }

    #[test]
    fn test_http_error_display() {
        let err = CloudError::from_status(403, "forbidden");
        assert_eq!(
            err.to_string(),
            "server responded with status 403: forbidden"
        );
    }
}
