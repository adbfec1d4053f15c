use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::session::SessionContext;
use crate::errors::AppError;
use crate::forms::{FieldPath, FieldUpdate, FormDefinition, SurveyForm, WizardSessions};

#[derive(Deserialize)]
pub struct SetFieldBody {
    pub path: String,
    pub value: Value,
}

/// GET /api/{form}/wizard
pub async fn view<F: FormDefinition>(
    session: Session,
    wizards: web::Data<WizardSessions<F>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    Ok(wizards.with(ctx.user_id, |w| HttpResponse::Ok().json(w.view())))
}

/// POST /api/{form}/wizard/reset: start a blank form.
pub async fn reset<F: FormDefinition>(
    session: Session,
    wizards: web::Data<WizardSessions<F>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    Ok(wizards.with(ctx.user_id, |w| {
        w.reset();
        HttpResponse::Ok().json(w.view())
    }))
}

/// POST /api/{form}/wizard/field: the single mutation entry point.
pub async fn set_field<F: FormDefinition>(
    session: Session,
    wizards: web::Data<WizardSessions<F>>,
    body: web::Json<SetFieldBody>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let body = body.into_inner();
    let update = FieldUpdate::new(FieldPath::parse(&body.path)?, body.value);

    wizards.with(ctx.user_id, |w| -> Result<HttpResponse, AppError> {
        w.set_field(&update)?;
        Ok(HttpResponse::Ok().json(w.view()))
    })
}

pub async fn next<F: FormDefinition>(
    session: Session,
    wizards: web::Data<WizardSessions<F>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    Ok(HttpResponse::Ok().json(wizards.with(ctx.user_id, |w| w.next())))
}

pub async fn previous<F: FormDefinition>(
    session: Session,
    wizards: web::Data<WizardSessions<F>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    Ok(HttpResponse::Ok().json(wizards.with(ctx.user_id, |w| w.previous())))
}

/// POST /api/{form}/wizard/goto/{section}
pub async fn go_to<F: FormDefinition>(
    session: Session,
    wizards: web::Data<WizardSessions<F>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let section = path.into_inner();
    let nav = wizards.with(ctx.user_id, |w| w.go_to(&section))?;
    Ok(HttpResponse::Ok().json(nav))
}

/// POST /api/surveys/wizard/transport-links
pub async fn add_transport_link(
    session: Session,
    wizards: web::Data<WizardSessions<SurveyForm>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    wizards.with(ctx.user_id, |w| -> Result<HttpResponse, AppError> {
        let update = w.form().add_transport_link_update()?;
        w.set_field(&update)?;
        Ok(HttpResponse::Ok().json(w.view()))
    })
}

/// POST /api/surveys/wizard/transport-links/{index}/remove: remaining
/// links are renumbered 1..N.
pub async fn remove_transport_link(
    session: Session,
    wizards: web::Data<WizardSessions<SurveyForm>>,
    path: web::Path<usize>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let index = path.into_inner();
    wizards.with(ctx.user_id, |w| -> Result<HttpResponse, AppError> {
        let update = w.form().remove_transport_link_update(index)?;
        w.set_field(&update)?;
        Ok(HttpResponse::Ok().json(w.view()))
    })
}
