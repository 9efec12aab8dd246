//! Error types for plyscene

use thiserror::Error;

/// Main error type for plyscene operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Texture error: {0}")]
    Texture(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for plyscene operations
pub type Result<T> = std::result::Result<T, Error>;
