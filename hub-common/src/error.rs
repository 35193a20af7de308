//! Error types shared across hub crates.

use thiserror::Error;

/// Result type alias using the hub error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Request-level errors raised while validating client input.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payload type the service does not accept
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Payload larger than the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::UnsupportedMediaType(_) => 415,
            Self::PayloadTooLarge(_) => 413,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::InvalidInput("test".into()).status_code(), 400);
        assert_eq!(Error::UnsupportedMediaType("image/gif".into()).status_code(), 415);
        assert_eq!(Error::PayloadTooLarge("11 MiB".into()).status_code(), 413);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidInput("empty upload".into()).to_string(),
            "Invalid input: empty upload"
        );
        assert_eq!(
            Error::UnsupportedMediaType("Please upload a JPEG or PNG image.".into()).to_string(),
            "Please upload a JPEG or PNG image."
        );
    }
}
