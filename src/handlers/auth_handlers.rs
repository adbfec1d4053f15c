use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::SessionContext;
use crate::auth::{csrf, password, rate_limit::RateLimiter};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::models::user;
use crate::templates_structs::LoginTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn login_page_with(
    session: &Session,
    config: &AppConfig,
    error: Option<&str>,
    email: &str,
) -> Result<HttpResponse, AppError> {
    render(LoginTemplate {
        error: error.map(str::to_string),
        org_name: config.org_name.clone(),
        csrf_token: csrf::get_or_create_token(session),
        email: email.to_string(),
    })
}

pub async fn login_page(
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    if SessionContext::from_session(&session).is_some() {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/dashboard"))
            .finish());
    }
    login_page_with(&session, &config, None, "")
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    config: web::Data<AppConfig>,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check before any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Sign-in blocked for {ip}: too many failures");
        return login_page_with(
            &session,
            &config,
            Some("Too many failed sign-in attempts. Please try again later."),
            &form.email,
        );
    }

    let found = user::find_by_email(&pool, &form.email).await?;
    let verified = match &found {
        Some(u) => password::verify_password(&form.password, &u.password)?,
        None => {
            password::verify_unknown_user(&form.password);
            false
        }
    };

    let ctx = found.as_ref().filter(|_| verified).and_then(SessionContext::for_user);
    match ctx {
        Some(ctx) => {
            limiter.clear(ip);
            ctx.store(&session)?;
            log::info!("User {} signed in as {}", ctx.user_id, ctx.role.as_str());
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/dashboard"))
                .finish())
        }
        None => {
            limiter.record_failure(ip);
            login_page_with(&session, &config, Some("Invalid email or password"), &form.email)
        }
    }
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/login"))
        .finish())
}
