//! Error types for ragpack.

use std::io;
use thiserror::Error;

/// Result type alias for ragpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while processing or exporting elements.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing or reading a ZIP archive failed.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing CSV output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An image payload is not valid base64.
    #[error("Invalid base64 payload: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// No partitioner is able to handle this file.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The partitioning collaborator failed.
    #[error("Partitioning failed: {0}")]
    Partition(String),

    /// Error during rendering (HTML, Markdown, JSON, RAG).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error while assembling an archive package.
    #[error("Packaging error: {0}")]
    Package(String),

    /// The image description service failed.
    #[error("Vision service error: {0}")]
    Vision(String),

    /// An external call did not finish in time.
    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    /// An external call was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// An optional capability is not available in this build or environment.
    #[error("Feature unavailable: {0}")]
    Unavailable(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");

        let err = Error::Timeout(1500);
        assert_eq!(err.to_string(), "Operation timed out after 1500 ms");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
