use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse, ResponseError,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header},
    middleware::Next,
};

use crate::auth::session::SessionContext;
use crate::errors::AppError;

fn wants_json(req: &ServiceRequest) -> bool {
    let path = req.path();
    path.starts_with("/api/") || path.starts_with("/ws/")
}

/// Requires a signed-in session. Pages redirect to /login; API calls get 401.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let signed_in = SessionContext::from_session(&req.get_session()).is_some();

    if !signed_in {
        let response = if wants_json(&req) {
            AppError::Session("Not signed in".to_string()).error_response()
        } else {
            HttpResponse::SeeOther()
                .insert_header(("Location", "/login"))
                .finish()
        };
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Requires the admin role. Wrap inside `require_auth`.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let is_admin = SessionContext::from_session(&req.get_session())
        .map(|ctx| ctx.is_admin())
        .unwrap_or(false);

    if !is_admin {
        log::warn!("Non-admin request to {}", req.path());
        let response = AppError::PermissionDenied("admin".to_string()).error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Mutating API requests must declare a JSON (or, for uploads, image) body.
/// Cross-site HTML forms cannot send either content type.
pub async fn require_api_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let mutating = matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH | Method::DELETE);
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();
    let accepted = content_type == "application/json" || content_type.starts_with("image/");

    if mutating && !accepted {
        let response = HttpResponse::UnsupportedMediaType()
            .json(serde_json::json!({ "error": "Expected Content-Type: application/json" }));
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
