use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Resource not found: {message}")]
    NotFound {
        message: String,
        request_id: Option<String>,
    },

    #[error("Version mismatch: {message}")]
    VersionMismatch { message: String },

    #[error("API returned error (HTTP {status}, {id}): {message}")]
    ApiError {
        status: u16,
        id: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed, check the management token")]
    AuthError,

    #[error("Too many requests, rate limited")]
    RateLimited,
}

impl ApiError {
    /// The remote entity does not exist (or no longer exists)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}
