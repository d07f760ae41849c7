//! Error types for Campdown operations.

use thiserror::Error;

/// Main error type for all Campdown operations.
#[derive(Debug, Error)]
pub enum CampdownError {
    /// The supplied URL has no usable scheme prefix.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A page fetch returned a non-200 status code.
    #[error("Request failed with status code {0}")]
    BadStatus(u16),

    /// The fetched page is not a recognized Bandcamp page.
    #[error("The supplied URL does not point to a recognized Bandcamp page")]
    UnrecognizedPage,

    /// An entity operation was called out of order (download before prepare).
    #[error("Entity has not been prepared: {0}")]
    NotPrepared(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Embedded JSON blob parsing failed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Campdown operations.
pub type Result<T> = std::result::Result<T, CampdownError>;
