use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{web, HttpResponse};
use report_core::{DocumentFormat, ReportPayload, TemplateLocation};
use serde::Serialize;

use crate::errors::AppError;
use crate::pipeline::ReportPipeline;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    /// Whether a template location other than the built-in default is set.
    pub template_configured: bool,
    pub template: String,
}

/// GET /health - Liveness check; never touches the template or converter
pub async fn health(pipeline: web::Data<ReportPipeline>) -> HttpResponse {
    let location = pipeline.template_location();
    HttpResponse::Ok().json(HealthStatus {
        status: "ok",
        template_configured: *location != TemplateLocation::default(),
        template: location.describe(),
    })
}

/// POST /generate-pptx - Fill the template and return it as a download
pub async fn generate_pptx(
    pipeline: web::Data<ReportPipeline>,
    payload: web::Json<ReportPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    log::info!("[generate-pptx] service code {}", payload.service_code);

    let pptx = pipeline.render_pptx(&payload).await?;
    Ok(attachment(DocumentFormat::Pptx, &payload, pptx))
}

/// POST /generate-pdf - Fill the template, convert it to PDF and return it
pub async fn generate_pdf(
    pipeline: web::Data<ReportPipeline>,
    payload: web::Json<ReportPayload>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    log::info!("[generate-pdf] service code {}", payload.service_code);

    let pdf = pipeline.render_pdf(&payload).await?;
    Ok(attachment(DocumentFormat::Pdf, &payload, pdf))
}

/// Binary download response with an ASCII fallback name and a UTF-8 `filename*`.
fn attachment(format: DocumentFormat, payload: &ReportPayload, body: Vec<u8>) -> HttpResponse {
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![
            DispositionParam::Filename(format.fallback_filename()),
            DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: payload.download_filename(format).into_bytes(),
            }),
        ],
    };

    HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(disposition)
        .body(body)
}
