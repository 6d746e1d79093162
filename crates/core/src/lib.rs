//! Core domain types, value normalization, and configuration for
//! PPTX/PDF report generation.

pub mod config;
pub mod error;
pub mod normalize;
pub mod placeholder;
pub mod types;

pub use config::{ConverterSettings, ServiceConfig, TemplateLocation};
pub use error::{Error, ErrorKind, Result};
pub use normalize::normalize_date;
pub use placeholder::{placeholder_keys, PlaceholderMap};
pub use types::{DocumentFormat, ExtractedSlide, ReportPayload, PAYLOAD_KEYS};
