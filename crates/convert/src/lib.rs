//! PPTX to PDF conversion.
//!
//! The [`Converter`] trait is the seam between the report pipeline and the
//! external office suite; [`LibreOfficeConverter`] is the production
//! implementation.

pub mod libreoffice;
pub mod locate;

pub use libreoffice::LibreOfficeConverter;
pub use locate::find_executable;

use report_core::Result;

/// Turns a PPTX document into a PDF document.
pub trait Converter: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Convert PPTX bytes into PDF bytes.
    ///
    /// Implementations may block; callers on an async runtime should run this
    /// on a blocking thread.
    fn convert(&self, pptx: &[u8]) -> Result<Vec<u8>>;
}
