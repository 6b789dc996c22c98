use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from terminal handling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network errors talking to the drive backend.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend error: {endpoint} returned status {status}")]
    Api { endpoint: &'static str, status: u16 },

    /// The backend payload could not be decoded.
    #[error("Malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Missing or invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
