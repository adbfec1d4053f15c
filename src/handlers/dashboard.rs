use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::session::SessionContext;
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::models::dashboard;
use crate::models::record::PgRecordStore;
use crate::templates_structs::{DashboardTemplate, PageContext};

pub async fn index(
    pool: web::Data<PgPool>,
    store: web::Data<PgRecordStore>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &config, "/dashboard")?;

    let (admin, engineer) = if ctx.is_admin() {
        (dashboard::load_admin(&pool, store.get_ref()).await, Default::default())
    } else {
        (
            Default::default(),
            dashboard::load_engineer(&pool, store.get_ref(), ctx.user.user_id).await,
        )
    };

    render(DashboardTemplate { ctx, admin, engineer })
}

/// JSON form of the dashboard for clients that refresh panels in place.
pub async fn data(
    pool: web::Data<PgPool>,
    store: web::Data<PgRecordStore>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    if ctx.is_admin() {
        Ok(HttpResponse::Ok().json(dashboard::load_admin(&pool, store.get_ref()).await))
    } else {
        Ok(HttpResponse::Ok().json(dashboard::load_engineer(&pool, store.get_ref(), ctx.user_id).await))
    }
}
