//! Error types for STAC access.

use thiserror::Error;

/// Errors produced while talking to a STAC catalog.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("unmapped archive source: {0}")]
    UnknownSource(String),

    #[error("STAC configuration error: {0}")]
    Config(String),
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;
