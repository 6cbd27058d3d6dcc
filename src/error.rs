//! Error types for element capture and export

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or exporting an element
#[derive(Error, Debug)]
pub enum Error {
    /// The CSS selector could not be parsed
    #[error("Invalid selector `{0}`")]
    InvalidSelector(String),

    /// The selector did not match an element in the document
    #[error("No element matches `{selector}` (index {index})")]
    ElementNotFound { selector: String, index: usize },

    /// Failed to load a document
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// Failed to rasterize the element
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to encode a bitmap
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// Failed to compose the PDF document
    #[error("PDF composition failed: {0}")]
    PdfError(String),

    /// Clipboard access or write failed
    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    /// Writing the downloaded file failed
    #[error("Download failed: {0}")]
    DownloadError(String),

    /// Opening the artifact in an external viewer failed
    #[error("Failed to open viewer: {0}")]
    OpenError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodeError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Background task failed: {}", err))
    }
}

#[cfg(feature = "clipboard")]
impl From<arboard::Error> for Error {
    fn from(err: arboard::Error) -> Self {
        Error::ClipboardError(err.to_string())
    }
}
