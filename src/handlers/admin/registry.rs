use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::field_registry::{Bucket, Direction, FieldDraft, FieldRegistry, FormBucket};

#[derive(Deserialize)]
pub struct SectionBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub direction: Direction,
}

#[derive(Deserialize)]
pub struct NewFieldBody {
    pub section: String,
    #[serde(flatten)]
    pub field: FieldDraft,
}

#[derive(Deserialize)]
pub struct ActiveBody {
    pub active: bool,
}

fn bucket_of(raw: &str) -> Result<FormBucket, AppError> {
    FormBucket::parse(raw).ok_or(AppError::NotFound)
}

fn bucket_json(bucket: &Bucket) -> HttpResponse {
    HttpResponse::Ok().json(bucket)
}

/// GET /api/admin/registry/{bucket}
pub async fn show(
    registry: web::Data<FieldRegistry>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let bucket = registry.load(bucket_of(&path)?)?;
    Ok(bucket_json(&bucket))
}

/// GET /api/registry/{bucket}/active: active fields per section, for any
/// signed-in client rendering a configurable form.
pub async fn active(
    registry: web::Data<FieldRegistry>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let bucket = registry.load(bucket_of(&path)?)?;
    let sections: Vec<_> = bucket
        .active_fields()
        .into_iter()
        .map(|(name, fields)| serde_json::json!({ "section": name, "fields": fields }))
        .collect();
    Ok(HttpResponse::Ok().json(sections))
}

pub async fn add_section(
    registry: web::Data<FieldRegistry>,
    path: web::Path<String>,
    body: web::Json<SectionBody>,
) -> Result<HttpResponse, AppError> {
    let (_, bucket) = registry.update(bucket_of(&path)?, |b| b.add_section(&body.name))?;
    Ok(bucket_json(&bucket))
}

/// DELETE /api/admin/registry/{bucket}/sections/{name}: refused while the
/// section still has fields.
pub async fn delete_section(
    registry: web::Data<FieldRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (raw, name) = path.into_inner();
    let (_, bucket) = registry.update(bucket_of(&raw)?, |b| b.delete_section(&name))?;
    Ok(bucket_json(&bucket))
}

pub async fn move_section(
    registry: web::Data<FieldRegistry>,
    path: web::Path<(String, String)>,
    body: web::Json<MoveBody>,
) -> Result<HttpResponse, AppError> {
    let (raw, name) = path.into_inner();
    let (_, bucket) = registry.update(bucket_of(&raw)?, |b| b.move_section(&name, body.direction))?;
    Ok(bucket_json(&bucket))
}

pub async fn add_field(
    registry: web::Data<FieldRegistry>,
    path: web::Path<String>,
    body: web::Json<NewFieldBody>,
) -> Result<HttpResponse, AppError> {
    let (id, bucket) = registry.update(bucket_of(&path)?, |b| b.add_field(&body.section, &body.field))?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id, "bucket": bucket })))
}

pub async fn update_field(
    registry: web::Data<FieldRegistry>,
    path: web::Path<(String, String)>,
    body: web::Json<FieldDraft>,
) -> Result<HttpResponse, AppError> {
    let (raw, id) = path.into_inner();
    let (_, bucket) = registry.update(bucket_of(&raw)?, |b| b.update_field(&id, &body))?;
    Ok(bucket_json(&bucket))
}

pub async fn delete_field(
    registry: web::Data<FieldRegistry>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (raw, id) = path.into_inner();
    let (_, bucket) = registry.update(bucket_of(&raw)?, |b| b.delete_field(&id))?;
    Ok(bucket_json(&bucket))
}

pub async fn move_field(
    registry: web::Data<FieldRegistry>,
    path: web::Path<(String, String)>,
    body: web::Json<MoveBody>,
) -> Result<HttpResponse, AppError> {
    let (raw, id) = path.into_inner();
    let (_, bucket) = registry.update(bucket_of(&raw)?, |b| b.move_field(&id, body.direction))?;
    Ok(bucket_json(&bucket))
}

pub async fn set_active(
    registry: web::Data<FieldRegistry>,
    path: web::Path<(String, String)>,
    body: web::Json<ActiveBody>,
) -> Result<HttpResponse, AppError> {
    let (raw, id) = path.into_inner();
    let (_, bucket) = registry.update(bucket_of(&raw)?, |b| b.toggle_active(&id, body.active))?;
    Ok(bucket_json(&bucket))
}
