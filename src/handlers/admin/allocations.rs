use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::password;
use crate::auth::session::SessionContext;
use crate::auth::validate::{validate_email, validate_password, validate_required};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::handlers::feed_handlers::{ALLOCATIONS_CHANGED, FeedHub, broadcast};
use crate::models::allocation::{self, NewAllocation, NewSite, StatusChange};
use crate::models::user::{self, EngineerForm, NewUser, Role};
use crate::templates_structs::{AllocationsTemplate, PageContext};

/// GET /admin/allocations
pub async fn page(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &config, "/admin/allocations")?;
    let tmpl = AllocationsTemplate {
        ctx,
        sites: allocation::find_sites(&pool).await?,
        engineers: user::find_engineers(&pool).await?,
        allocations: allocation::find_all(&pool).await?,
    };
    render(tmpl)
}

// ---------- Sites ----------

pub async fn list_sites(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(allocation::find_sites(&pool).await?))
}

pub async fn create_site(
    pool: web::Data<PgPool>,
    body: web::Json<NewSite>,
) -> Result<HttpResponse, AppError> {
    let mut errors = body.validate();
    if errors.is_empty() && allocation::site_name_exists(&pool, &body.name).await? {
        errors.push(format!("A site named '{}' already exists", body.name.trim()));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id = allocation::create_site(&pool, &body).await?;
    log::info!("Created site {id} '{}'", body.name.trim());
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

// ---------- Engineers ----------

pub async fn list_engineers(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(user::find_engineers(&pool).await?))
}

/// POST /api/admin/engineers: provision an engineer account.
pub async fn create_engineer(
    pool: web::Data<PgPool>,
    body: web::Json<EngineerForm>,
) -> Result<HttpResponse, AppError> {
    let mut errors: Vec<String> = [
        validate_email(&body.email),
        validate_required(&body.display_name, "Display name", 100),
        validate_password(&body.password),
    ]
    .into_iter()
    .flatten()
    .collect();
    if errors.is_empty() && user::email_exists(&pool, &body.email).await? {
        errors.push("An account with that email already exists".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let new = NewUser {
        email: body.email.trim().to_string(),
        display_name: body.display_name.trim().to_string(),
        password: password::hash_password(&body.password)?,
        role: Role::Engineer,
    };
    let id = user::create(&pool, &new).await?;
    log::info!("Provisioned engineer {id} ({})", new.email);
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

// ---------- Allocations ----------

pub async fn list_allocations(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(allocation::find_all(&pool).await?))
}

pub async fn create_allocation(
    pool: web::Data<PgPool>,
    hub: web::Data<FeedHub>,
    session: Session,
    body: web::Json<NewAllocation>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require_admin(&session)?;
    let errors = body.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id = allocation::create(&pool, &body, ctx.user_id).await?;
    log::info!("Allocated site {} to engineer {} (allocation {id})", body.site_id, body.engineer_id);
    broadcast(&hub, ALLOCATIONS_CHANGED);
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

pub async fn delete_allocation(
    pool: web::Data<PgPool>,
    hub: web::Data<FeedHub>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    allocation::delete(&pool, id).await?;
    log::info!("Deleted allocation {id}");
    broadcast(&hub, ALLOCATIONS_CHANGED);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/allocations/{id}/status: admins, or the assigned engineer.
pub async fn change_status(
    pool: web::Data<PgPool>,
    hub: web::Data<FeedHub>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<StatusChange>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let id = path.into_inner();

    let current = allocation::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    if !ctx.can_edit(current.engineer_id) {
        return Err(AppError::PermissionDenied(format!("allocation {id}")));
    }

    allocation::update_status(&pool, id, body.status).await?;
    log::info!("Allocation {id} moved to {} by user {}", body.status.as_str(), ctx.user_id);
    broadcast(&hub, ALLOCATIONS_CHANGED);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "status": body.status })))
}

/// GET /api/allocations/mine
pub async fn mine(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    Ok(HttpResponse::Ok().json(allocation::find_for_engineer(&pool, ctx.user_id).await?))
}
