//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while fetching geometry or textures
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for plyscene_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(e) => plyscene_core::Error::Io(e),
            IoError::Image(e) => plyscene_core::Error::Texture(e.to_string()),
            IoError::InvalidFormat { format } => plyscene_core::Error::UnsupportedFormat(format),
            other => plyscene_core::Error::InvalidData(other.to_string()),
        }
    }
}
