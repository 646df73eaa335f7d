//! Error types for the SVG grid converter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SVG grid converter
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input path missing or unreadable at render time
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Input could not be parsed or rendered as an image
    #[error("Failed to render {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },

    /// Input extension is not a supported image format
    #[error("Unsupported image format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Every input failed, nothing to write
    #[error("No valid images to convert ({failed} of {total} inputs failed)")]
    NoValidImages { total: usize, failed: usize },

    /// Output could not be written
    #[error("Cannot write output {} ({failed} images had failed): {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        failed: usize,
        #[source]
        source: std::io::Error,
    },

    /// Page layout references an image that has no rendered unit
    #[error("Page {page} references image {image}, which was not rendered")]
    MissingImage { page: usize, image: usize },

    /// Invalid grid or page configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No image files found matching: {0}")]
    NoFilesMatched(String),

    /// Settings file could not be parsed or serialized
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Run stopped through the cancellation flag
    #[error("Conversion cancelled after {processed} of {total} images")]
    Cancelled { processed: usize, total: usize },

    /// Background worker thread panicked
    #[error("Conversion worker panicked")]
    WorkerPanicked,
}

impl Error {
    /// Whether this error concerns a single input and should only skip that image
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            Error::InputNotFound(_) | Error::Render { .. } | Error::UnsupportedFormat(_)
        )
    }

    /// Number of failed images carried by a run-level error
    pub fn failed_count(&self) -> usize {
        match self {
            Error::NoValidImages { failed, .. } | Error::OutputWrite { failed, .. } => *failed,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_image_classification() {
        assert!(Error::InputNotFound(PathBuf::from("a.svg")).is_per_image());
        assert!(Error::Render {
            path: PathBuf::from("a.svg"),
            message: "bad xml".to_string(),
        }
        .is_per_image());
        assert!(Error::UnsupportedFormat(PathBuf::from("a.txt")).is_per_image());
        assert!(!Error::NoValidImages { total: 3, failed: 3 }.is_per_image());
        assert!(!Error::InvalidConfig("x".to_string()).is_per_image());
    }

    #[test]
    fn test_failed_count() {
        let err = Error::NoValidImages { total: 5, failed: 5 };
        assert_eq!(err.failed_count(), 5);
        assert!(err.to_string().contains("5 of 5"));

        let err = Error::OutputWrite {
            path: PathBuf::from("out.pdf"),
            failed: 2,
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.failed_count(), 2);
        assert_eq!(Error::WorkerPanicked.failed_count(), 0);
    }
}
