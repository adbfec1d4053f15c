use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::capture::CaptureError;
use crate::export::ExportError;
use crate::forms::FieldError;
use crate::local_store::StoreError;
use crate::models::field_registry::RegistryError;

/// Shown for every failure the user cannot fix by editing the form.
pub const RETRY_MESSAGE: &str = "Something went wrong. Your work is unchanged - please try again.";

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Template(askama::Error),
    Hash(String),
    Session(String),
    Csrf,
    PermissionDenied(String),
    Validation(Vec<String>),
    /// Required form fields missing at submit time.
    Incomplete(Vec<String>),
    Field(FieldError),
    Store(StoreError),
    Registry(RegistryError),
    Capture(CaptureError),
    Export(ExportError),
    Blocking(String),
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Csrf => write!(f, "Invalid or missing CSRF token"),
            AppError::PermissionDenied(what) => write!(f, "Permission denied: {what}"),
            AppError::Validation(errors) => write!(f, "Invalid input: {}", errors.join(", ")),
            AppError::Incomplete(missing) => {
                write!(f, "Missing or invalid fields: {}", missing.join(", "))
            }
            AppError::Field(e) => write!(f, "{e}"),
            AppError::Store(e) => write!(f, "Local store error: {e}"),
            AppError::Registry(e) => write!(f, "{e}"),
            AppError::Capture(e) => write!(f, "{e}"),
            AppError::Export(e) => write!(f, "{e}"),
            AppError::Blocking(e) => write!(f, "Background task failed: {e}"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Incomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Field(_) | AppError::Registry(_) | AppError::Capture(_) => StatusCode::BAD_REQUEST,
            AppError::Csrf | AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(errors) => serde_json::json!({
                "error": "Some values are missing or invalid.",
                "details": errors,
            }),
            AppError::Incomplete(missing) => serde_json::json!({
                "error": "Please complete the required fields before submitting.",
                "details": missing,
            }),
            AppError::Field(_)
            | AppError::Registry(_)
            | AppError::Capture(_)
            | AppError::Csrf
            | AppError::PermissionDenied(_)
            | AppError::Session(_) => {
                log::warn!("{self}");
                serde_json::json!({ "error": self.to_string() })
            }
            AppError::NotFound => serde_json::json!({ "error": "Not found" }),
            _ => {
                log::error!("{self}");
                serde_json::json!({ "error": RETRY_MESSAGE })
            }
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Blocking(e.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<FieldError> for AppError {
    fn from(e: FieldError) -> Self {
        AppError::Field(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        AppError::Registry(e)
    }
}

impl From<CaptureError> for AppError {
    fn from(e: CaptureError) -> Self {
        AppError::Capture(e)
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e)
    }
}

/// Render an askama template into an HTML response.
pub fn render(tmpl: impl askama::Template) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(tmpl.render()?))
}
