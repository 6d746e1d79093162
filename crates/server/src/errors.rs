use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use report_core::ErrorKind;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Report(report_core::Error),
    Blocking(String),
}

impl AppError {
    /// Message sent to the client in the `detail` field.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Report(e) => write!(f, "{e}"),
            AppError::Blocking(e) => write!(f, "Worker error: {e}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Report(e) if e.kind() == ErrorKind::Validation => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        HttpResponse::build(status).json(serde_json::json!({ "detail": self.detail() }))
    }
}

impl From<report_core::Error> for AppError {
    fn from(e: report_core::Error) -> Self {
        AppError::Report(e)
    }
}

impl From<BlockingError> for AppError {
    fn from(e: BlockingError) -> Self {
        AppError::Blocking(e.to_string())
    }
}
