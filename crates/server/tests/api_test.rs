//! End-to-end tests of the HTTP endpoints.
//!
//! The app is assembled the same way `main` does it, with a scaffold PPTX as
//! the template and stub converters standing in for LibreOffice.

use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{middleware, test, web, App};
use report_convert::{Converter, LibreOfficeConverter};
use report_core::{ConverterSettings, DocumentFormat, Error, Result, TemplateLocation};
use report_pptx::{scaffold, SlideReader};
use report_server::{cors, pipeline::ReportPipeline, template::TemplateLoader};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Converter that returns a fixed PDF after checking it was given a PPTX.
struct StubConverter;

impl Converter for StubConverter {
    fn name(&self) -> &str {
        "stub"
    }

    fn convert(&self, pptx: &[u8]) -> Result<Vec<u8>> {
        if DocumentFormat::from_magic(pptx) != Some(DocumentFormat::Pptx) {
            return Err(Error::ConversionFailed("stub expected a PPTX".into()));
        }
        Ok(b"%PDF-1.7\n%stub\n%%EOF\n".to_vec())
    }
}

macro_rules! test_app {
    ($template:expr, $converter:expr) => {{
        let loader = TemplateLoader::new($template).unwrap();
        let pipeline = web::Data::new(ReportPipeline::new(loader, $converter));
        test::init_service(
            App::new()
                .wrap(middleware::from_fn(cors::permissive_cors))
                .app_data(pipeline)
                .configure(report_server::configure),
        )
        .await
    }};
}

/// Write a two-slide template into a temp dir.
fn template_file() -> (TempDir, TemplateLocation) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report_template.pptx");
    let pptx = scaffold::build_pptx(&[
        &[
            "Name: {{NAME_EN}}",
            "الاسم: {{NAME_AR}}",
            "Entry: {{ENTRY_DATE_GREGORIAN}} Hijri: {{ENTRY_DATE_HIJRI}}",
        ],
        &["{{DAYS_COUNT}} days at {{HOSPITAL_NAME_EN}}", "Printed {{PRINT_DATE}} {{PRINT_TIME}}"],
    ]);
    std::fs::write(&path, pptx).unwrap();
    (dir, TemplateLocation::Path(path))
}

fn missing_template() -> TemplateLocation {
    TemplateLocation::Path(PathBuf::from("/nonexistent/templates/report_template.pptx"))
}

fn payload() -> serde_json::Value {
    serde_json::json!({
        "SERVICE_CODE": "GSL-1001",
        "ID_NUMBER": "1234567890",
        "NAME_AR": "محمد",
        "NAME_EN": "Mohammed",
        "DAYS_COUNT": 3,
        "ENTRY_DATE_GREGORIAN": "2024-1-5",
        "EXIT_DATE_GREGORIAN": "2024-01-07",
        "ENTRY_DATE_HIJRI": null,
        "EXIT_DATE_HIJRI": "1445/6/25",
        "REPORT_ISSUE_DATE": "2024-01-05",
        "NATIONALITY_AR": "سعودي",
        "NATIONALITY_EN": "Saudi",
        "DOCTOR_NAME_AR": "أحمد",
        "DOCTOR_NAME_EN": "Ahmed",
        "JOB_TITLE_AR": "طبيب",
        "JOB_TITLE_EN": "Physician",
        "HOSPITAL_NAME_AR": "مستشفى",
        "HOSPITAL_NAME_EN": "General Hospital",
        "PRINT_DATE": "2024-01-08",
        "PRINT_TIME": "10:30"
    })
}

fn header_str<B>(resp: &actix_web::dev::ServiceResponse<B>, name: header::HeaderName) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_health_ok_without_template_or_converter() {
    let app = test_app!(
        missing_template(),
        Arc::new(LibreOfficeConverter::new(
            ConverterSettings::default().with_executable("/nonexistent/soffice")
        ))
    );

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["template_configured"], true);
    assert_eq!(body["template"], "/nonexistent/templates/report_template.pptx");
}

#[actix_web::test]
async fn test_generate_pptx_returns_filled_presentation() {
    let (_dir, template) = template_file();
    let app = test_app!(template, Arc::new(StubConverter));

    let req = test::TestRequest::post()
        .uri("/generate-pptx")
        .set_json(payload())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_str(&resp, header::CONTENT_TYPE),
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    );
    let disposition = header_str(&resp, header::CONTENT_DISPOSITION);
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(r#"filename="sickLeaves.pptx""#));
    assert!(disposition.contains("filename*=UTF-8''sickLeaves_"));
    assert!(disposition.contains("_1234567890.pptx"));

    let body = test::read_body(resp).await;
    assert_eq!(DocumentFormat::from_magic(&body), Some(DocumentFormat::Pptx));

    let slides = SlideReader::new().read(&body).unwrap();
    assert_eq!(
        slides[0].lines,
        vec!["Name: Mohammed", "الاسم: محمد", "Entry: 05-01-2024 Hijri: "]
    );
    assert_eq!(
        slides[1].lines,
        vec!["3 days at General Hospital", "Printed 08-01-2024 10:30"]
    );
}

#[actix_web::test]
async fn test_generate_pdf_returns_converted_document() {
    let (_dir, template) = template_file();
    let app = test_app!(template, Arc::new(StubConverter));

    let req = test::TestRequest::post()
        .uri("/generate-pdf")
        .set_json(payload())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "application/pdf");
    assert!(header_str(&resp, header::CONTENT_DISPOSITION).contains(r#"filename="sickLeaves.pdf""#));

    let body = test::read_body(resp).await;
    assert_eq!(DocumentFormat::from_magic(&body), Some(DocumentFormat::Pdf));
}

#[actix_web::test]
async fn test_missing_template_fails_both_endpoints() {
    let app = test_app!(missing_template(), Arc::new(StubConverter));

    for uri in ["/generate-pptx", "/generate-pdf"] {
        let req = test::TestRequest::post().uri(uri).set_json(payload()).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(header_str(&resp, header::CONTENT_DISPOSITION).is_empty());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["detail"],
            "Template not found: /nonexistent/templates/report_template.pptx"
        );
    }
}

#[actix_web::test]
async fn test_corrupt_template_is_template_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.pptx");
    std::fs::write(&path, b"this is not a presentation").unwrap();
    let app = test_app!(TemplateLocation::Path(path), Arc::new(StubConverter));

    let req = test::TestRequest::post()
        .uri("/generate-pptx")
        .set_json(payload())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Template error: not a valid PPTX archive"));
}

#[actix_web::test]
async fn test_unavailable_converter_only_breaks_pdf() {
    let (_dir, template) = template_file();
    let converter = LibreOfficeConverter::new(
        ConverterSettings::default().with_executable("/nonexistent/libreoffice/soffice"),
    );
    let app = test_app!(template, Arc::new(converter));

    let req = test::TestRequest::post()
        .uri("/generate-pdf")
        .set_json(payload())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("not found"));

    let req = test::TestRequest::post()
        .uri("/generate-pptx")
        .set_json(payload())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_invalid_payload_is_422() {
    let (_dir, template) = template_file();
    let app = test_app!(template, Arc::new(StubConverter));

    let mut incomplete = payload();
    incomplete.as_object_mut().unwrap().remove("NAME_AR");
    let req = test::TestRequest::post()
        .uri("/generate-pptx")
        .set_json(incomplete)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("NAME_AR"));

    let mut wrong_type = payload();
    wrong_type["DAYS_COUNT"] = serde_json::json!("three");
    let req = test::TestRequest::post()
        .uri("/generate-pdf")
        .set_json(wrong_type)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_days_count_sent_as_text_is_accepted() {
    let (_dir, template) = template_file();
    let app = test_app!(template, Arc::new(StubConverter));

    let mut body = payload();
    body["DAYS_COUNT"] = serde_json::json!("3");
    let req = test::TestRequest::post()
        .uri("/generate-pptx")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let slides = SlideReader::new().read(&test::read_body(resp).await).unwrap();
    assert_eq!(slides[1].lines[0], "3 days at General Hospital");
}

#[actix_web::test]
async fn test_malformed_json_is_422() {
    let (_dir, template) = template_file();
    let app = test_app!(template, Arc::new(StubConverter));

    let req = test::TestRequest::post()
        .uri("/generate-pptx")
        .insert_header(ContentType::json())
        .set_payload("{\"SERVICE_CODE\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_cors_preflight_is_answered() {
    let app = test_app!(missing_template(), Arc::new(StubConverter));

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/generate-pdf")
        .insert_header((header::ORIGIN, "https://reports.example.com"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "https://reports.example.com"
    );
    assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_CREDENTIALS), "true");
    assert!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_METHODS).contains("POST"));
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_HEADERS),
        "content-type"
    );
}

#[actix_web::test]
async fn test_cors_headers_on_responses() {
    let app = test_app!(missing_template(), Arc::new(StubConverter));

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "http://localhost:3000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "http://localhost:3000"
    );
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_EXPOSE_HEADERS),
        "Content-Disposition"
    );
}

#[cfg(unix)]
mod with_fake_libreoffice {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    fn fake_soffice(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("soffice");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    const WRITES_PDF: &str = r#"
while [ $# -gt 1 ]; do
  if [ "$1" = "--outdir" ]; then out="$2"; fi
  shift
done
printf '%%PDF-1.4\n%%%%EOF\n' > "$out/$(basename "$1" .pptx).pdf"
"#;

    async fn generate_pdf_with(script: &str, timeout: Duration) -> (StatusCode, bool) {
        let (_template_dir, template) = template_file();
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let converter = LibreOfficeConverter::new(
            ConverterSettings::default()
                .with_executable(fake_soffice(bin.path(), script))
                .with_timeout(timeout)
                .with_work_dir(work.path()),
        );
        let app = test_app!(template, Arc::new(converter));

        let req = test::TestRequest::post()
            .uri("/generate-pdf")
            .set_json(payload())
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let _ = test::read_body(resp).await;

        (status, scratch_is_empty(work.path()))
    }

    #[actix_web::test]
    async fn test_temp_files_removed_after_success() {
        let (status, clean) = generate_pdf_with(WRITES_PDF, Duration::from_secs(10)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(clean);
    }

    #[actix_web::test]
    async fn test_temp_files_removed_after_failure() {
        let (status, clean) = generate_pdf_with("exit 1\n", Duration::from_secs(10)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(clean);
    }

    #[actix_web::test]
    async fn test_temp_files_removed_after_timeout() {
        let (status, clean) =
            generate_pdf_with("sleep 10\n", Duration::from_millis(200)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(clean);
    }
}
