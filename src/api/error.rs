//! Gateway error types

use thiserror::Error;

/// Errors that can occur when calling the Data Mosaic backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, TLS)
    #[error("Network error: {message}")]
    Network { message: String },
    /// The backend answered with a non-2xx status
    #[error("{}", server_text(.status, .body))]
    Server { status: u16, body: String },
    /// A 2xx response whose body did not match the expected shape
    #[error("Unexpected response from backend: {message}")]
    Decode { message: String },
}

/// The body is shown verbatim; an empty body falls back to the status code.
fn server_text(status: &u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

impl ApiError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    /// Create a server error from a status code and response body
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        ApiError::Server {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
        }
    }

    /// HTTP status, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::server(status.as_u16(), err.to_string())
        } else {
            ApiError::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_displays_body_verbatim() {
        let err = ApiError::server(500, r#"{"detail":"Failed to create source: boom"}"#);
        assert_eq!(
            err.to_string(),
            r#"{"detail":"Failed to create source: boom"}"#
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_server_error_with_empty_body_shows_status() {
        let err = ApiError::server(502, "  ");
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn test_network_error_display() {
        let err = ApiError::network("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert!(err.is_network());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_is_not_found() {
        assert!(ApiError::server(404, "Source not found.").is_not_found());
        assert!(!ApiError::server(500, "oops").is_not_found());
        assert!(!ApiError::decode("bad json").is_not_found());
    }
}
