//! Custom error types for sitemap-validator

use thiserror::Error;

/// Main error type for sitemap-validator operations
///
/// Only conditions that prevent a validation run from starting surface as an
/// `Error`. Everything a sitemap can get wrong is recorded as a diagnostic on
/// the [`ValidationResult`](crate::models::ValidationResult) instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme '{0}': only http and https are allowed")]
    UnsupportedScheme(String),

    #[error("Host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Decompression error: {0}")]
    Decompress(String),

    #[error("Body exceeds the maximum size of {0} bytes")]
    TooLarge(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for sitemap-validator
pub type Result<T> = std::result::Result<T, Error>;
