//! Error types for report generation.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or converting a report.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (template location, converter path, settings).
    #[error("{0}")]
    ConfigError(String),

    /// The request payload could not be accepted.
    #[error("Invalid payload: {0}")]
    ValidationError(String),

    /// The template is unreadable or is not a usable PPTX.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// The converter executable could not be located.
    #[error("{0}")]
    ConverterNotFound(String),

    /// The converter ran but did not produce a usable PDF.
    #[error("LibreOffice conversion failed: {0}")]
    ConversionFailed(String),

    /// The converter did not finish in time and was killed.
    #[error("LibreOffice conversion timed out after {}s", .0.as_secs())]
    ConversionTimeout(Duration),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Template,
    Conversion,
    Validation,
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigError(_) => ErrorKind::Configuration,
            Error::ValidationError(_) => ErrorKind::Validation,
            Error::TemplateError(_) | Error::ZipError(_) | Error::XmlError(_) => {
                ErrorKind::Template
            }
            Error::ConverterNotFound(_)
            | Error::ConversionFailed(_)
            | Error::ConversionTimeout(_) => ErrorKind::Conversion,
            Error::IoError(_) => ErrorKind::Io,
        }
    }
}
