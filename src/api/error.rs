use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failures surfaced by the gallery engine.
///
/// Every variant maps to a single line suitable for a status bar via
/// [`ApiError::user_message`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response was received
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// 4xx response
    #[error("client error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Client { status: u16, detail: Option<String> },

    /// 5xx response
    #[error("server error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    /// Rejected locally before any request was made
    #[error("{0}")]
    Validation(String),

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("archive error: {0}")]
    Archive(String),
}

impl ApiError {
    /// Build the error for a non-success HTTP status and its (optional) detail
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        if status >= 500 {
            ApiError::Server { status, detail }
        } else {
            ApiError::Client { status, detail }
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error, please check your connection".to_string(),
            ApiError::Timeout => {
                "Request timed out, check your connection or try again later".to_string()
            }
            ApiError::Client { status, detail } => {
                let detail = detail.clone();
                match status {
                    400 => detail.unwrap_or_else(|| "Invalid request parameters".to_string()),
                    401 => "Unauthorized, please sign in again".to_string(),
                    403 => "No permission to access this resource".to_string(),
                    404 => detail.unwrap_or_else(|| "Resource not found".to_string()),
                    413 => "File too large, please use a smaller file".to_string(),
                    422 => detail.unwrap_or_else(|| "Validation failed, check your input".to_string()),
                    _ => detail.unwrap_or_else(|| "Request failed".to_string()),
                }
            }
            ApiError::Server { status, detail } => match (status, detail) {
                (500, Some(detail)) => detail.clone(),
                (500, None) => "Internal server error, please try again later".to_string(),
                _ => "Server error, please try again later".to_string(),
            },
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
            ApiError::Io(msg) => format!("File error: {}", msg),
            ApiError::Archive(msg) => format!("Could not build archive: {}", msg),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::from_status(status.as_u16(), None)
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Io(e.to_string())
    }
}

impl From<zip::result::ZipError> for ApiError {
    fn from(e: zip::result::ZipError) -> Self {
        ApiError::Archive(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(ApiError::from_status(404, None), ApiError::Client { .. }));
        assert!(matches!(ApiError::from_status(503, None), ApiError::Server { .. }));
    }

    #[test]
    fn test_detail_preferred_where_available() {
        let err = ApiError::from_status(404, Some("Record does not exist".to_string()));
        assert_eq!(err.user_message(), "Record does not exist");

        let err = ApiError::from_status(404, None);
        assert_eq!(err.user_message(), "Resource not found");

        // 401 and 403 ignore the server detail
        let err = ApiError::from_status(403, Some("role missing".to_string()));
        assert_eq!(err.user_message(), "No permission to access this resource");
    }

    #[test]
    fn test_server_errors() {
        let err = ApiError::from_status(500, Some("db down".to_string()));
        assert_eq!(err.user_message(), "db down");

        let err = ApiError::from_status(502, Some("bad gateway".to_string()));
        assert_eq!(err.user_message(), "Server error, please try again later");
    }

    #[test]
    fn test_transport() {
        assert!(ApiError::Timeout.is_transport());
        assert!(ApiError::Network("refused".into()).is_transport());
        assert!(!ApiError::Validation("x".into()).is_transport());
    }
}
