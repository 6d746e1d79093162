//! PPTX (Office Open XML) template binder.
//!
//! A .pptx file is a ZIP archive of XML parts. The binder copies the archive
//! and rewrites the slide parts, replacing `{{KEY}}` placeholders in text runs.

pub mod binder;
mod package;
pub mod reader;

#[cfg(any(test, feature = "test-support"))]
pub mod scaffold;

pub use binder::TemplateBinder;
pub use reader::{SlideReader, TemplateReport};
