use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};

use crate::auth::session::SessionContext;
use crate::capture::{CaptureSource, Drawing, ImagePayload};
use crate::errors::AppError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataUriBody {
    data_uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CaptureResponse<'a> {
    data_uri: &'a str,
    mime: &'a str,
    source: CaptureSource,
}

fn respond(payload: &ImagePayload, source: CaptureSource) -> HttpResponse {
    HttpResponse::Ok().json(CaptureResponse {
        data_uri: payload.as_str(),
        mime: payload.mime(),
        source,
    })
}

/// POST /api/capture/upload
///
/// Accepts either raw image bytes (`Content-Type: image/*`, from a file
/// picker) or `{"dataUri": "..."}` (a camera frame grabbed in the browser).
/// Either way the response carries the normalised data URI.
pub async fn upload(
    req: HttpRequest,
    session: Session,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;

    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let (payload, source) = if is_json {
        let parsed: DataUriBody = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(vec![format!("Malformed capture body: {e}")]))?;
        (ImagePayload::parse(&parsed.data_uri)?, CaptureSource::Camera)
    } else {
        (ImagePayload::from_bytes(&body)?, CaptureSource::Upload)
    };

    log::debug!("User {} captured {} ({} bytes)", ctx.user_id, payload.mime(), body.len());
    Ok(respond(&payload, source))
}

/// POST /api/capture/drawing: rasterise signature or sketch strokes.
pub async fn drawing(
    session: Session,
    body: web::Json<Drawing>,
) -> Result<HttpResponse, AppError> {
    SessionContext::require(&session)?;
    let drawing = body.into_inner();
    let payload = web::block(move || drawing.render()).await??;
    Ok(respond(&payload, CaptureSource::Drawing))
}
