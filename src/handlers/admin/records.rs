use actix_web::{HttpResponse, web};

use crate::errors::AppError;
use crate::models::record::{PgRecordStore, RecordFilter, RecordStore};

/// GET /api/admin/records?status=&site=&owner_id=&form_type=
pub async fn list(
    store: web::Data<PgRecordStore>,
    filter: web::Query<RecordFilter>,
) -> Result<HttpResponse, AppError> {
    let rows = store.list(&filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/admin/records/{id}: full record with its form data.
pub async fn detail(
    store: web::Data<PgRecordStore>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let stored = store.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    let columns = stored.columns();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": stored.id,
        "formType": stored.form_type,
        "status": stored.status,
        "ownerId": stored.owner_id,
        "columns": columns,
        "data": stored.data.0,
        "createdAt": stored.created_at,
        "updatedAt": stored.updated_at,
    })))
}
