//! Error types for the drive_index crate.

use thiserror::Error;

/// Errors that can occur while building or writing an index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by the API after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("No sharable link available for entry: {0}")]
    LinkUnavailable(String),

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to write CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IndexError {
    /// Map an HTTP status and error body onto the matching variant.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => IndexError::AuthenticationError(message),
            404 => IndexError::NotFound(message),
            _ => IndexError::ApiError { status, message },
        }
    }
}

/// Result type alias for IndexError.
pub type Result<T> = std::result::Result<T, IndexError>;
