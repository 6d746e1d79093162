//! HTTP service that fills a PPTX report template and optionally converts
//! it to PDF.

pub mod cors;
pub mod errors;
pub mod handlers;
pub mod pipeline;
pub mod template;

use actix_web::web;
use report_core::Error;

use crate::errors::AppError;

/// Largest accepted JSON body.
const JSON_LIMIT: usize = 256 * 1024;

/// Register the report routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| AppError::from(Error::ValidationError(err.to_string())).into());

    cfg.app_data(json)
        .route("/health", web::get().to(handlers::health))
        .route("/generate-pptx", web::post().to(handlers::generate_pptx))
        .route("/generate-pdf", web::post().to(handlers::generate_pdf));
}
