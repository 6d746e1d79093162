//! Template binding and conversion for one request.

use crate::errors::AppError;
use crate::template::TemplateLoader;
use actix_web::web;
use report_convert::Converter;
use report_core::{ReportPayload, TemplateLocation};
use report_pptx::TemplateBinder;
use std::sync::Arc;

/// Shared, read-only state behind the generate endpoints.
pub struct ReportPipeline {
    templates: TemplateLoader,
    binder: TemplateBinder,
    converter: Arc<dyn Converter>,
}

impl ReportPipeline {
    pub fn new(templates: TemplateLoader, converter: Arc<dyn Converter>) -> Self {
        Self {
            templates,
            binder: TemplateBinder::new(),
            converter,
        }
    }

    pub fn template_location(&self) -> &TemplateLocation {
        self.templates.location()
    }

    /// Fill the template with `payload`.
    pub async fn render_pptx(&self, payload: &ReportPayload) -> Result<Vec<u8>, AppError> {
        let template = self.templates.load().await?;
        let values = payload.placeholders();
        let binder = self.binder;

        let pptx = web::block(move || binder.bind(&template, &values)).await??;
        Ok(pptx)
    }

    /// Fill the template and convert the result to PDF.
    ///
    /// The conversion runs on the blocking pool. If the client goes away the
    /// converter keeps running until it finishes or hits its timeout.
    pub async fn render_pdf(&self, payload: &ReportPayload) -> Result<Vec<u8>, AppError> {
        let pptx = self.render_pptx(payload).await?;
        let converter = Arc::clone(&self.converter);

        log::debug!("Converting {} bytes with {}", pptx.len(), converter.name());
        let pdf = web::block(move || converter.convert(&pptx)).await??;
        Ok(pdf)
    }
}
