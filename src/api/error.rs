use serde::Deserialize;
use thiserror::Error;

/// One spreadsheet row rejected by server-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RowError {
    pub line: u32,
    pub reason: String,
}

/// Batch of row validation failures from a group-inscription upload.
/// Uploads are all-or-nothing: the whole file is rejected together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ValidationBatch {
    #[serde(default)]
    pub errors: Vec<RowError>,
}

impl ValidationBatch {
    /// Parse a server message field that is itself a JSON document of the
    /// form `{"errors":[{"line":3,"reason":"..."}]}`.
    pub fn parse(message: &str) -> Option<Self> {
        let batch: ValidationBatch = serde_json::from_str(message).ok()?;
        if batch.errors.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

impl std::fmt::Display for ValidationBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} spreadsheet rows failed validation", self.errors.len())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(ValidationBatch),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the human message out of an error body.
    /// Bodies carry either `{"data":{"message":...}}` or a bare `{"message":...}`.
    fn extract_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value["data"]["message"]
            .as_str()
            .or_else(|| value["message"].as_str())
            .map(str::to_string)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message =
            Self::extract_message(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 | 422 => match ValidationBatch::parse(&message) {
                Some(batch) => ApiError::Validation(batch),
                None => ApiError::Rejected(message),
            },
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Whether a retry could plausibly succeed. Validation and other
    /// client-side rejections never retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::ServerError(_) | ApiError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_extracts_nested_message() {
        let body = r#"{"data":{"message":"Evento não encontrado"}}"#;
        let err = ApiError::from_status(reqwest::StatusCode::NOT_FOUND, body);
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Evento não encontrado"));
    }

    #[test]
    fn test_from_status_parses_validation_batch() {
        let inner = r#"{"errors":[{"line":3,"reason":"Nome inválido"},{"line":7,"reason":"Data inválida"}]}"#;
        let body = serde_json::json!({ "data": { "message": inner } }).to_string();
        let err = ApiError::from_status(reqwest::StatusCode::BAD_REQUEST, &body);

        let ApiError::Validation(batch) = err else {
            panic!("expected validation batch");
        };
        assert_eq!(batch.errors.len(), 2);
        assert_eq!(batch.errors[0].line, 3);
        assert_eq!(batch.errors[0].reason, "Nome inválido");
        assert_eq!(batch.errors[1].line, 7);
        assert_eq!(batch.errors[1].reason, "Data inválida");
    }

    #[test]
    fn test_from_status_plain_bad_request() {
        let body = r#"{"message":"Telefone inválido"}"#;
        let err = ApiError::from_status(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Telefone inválido"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_status_server_error_is_retryable() {
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(600);
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &long);
        let message = err.to_string();
        assert!(message.contains("truncated"));
        assert!(message.len() < long.len());
    }
}
