use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;

use crate::auth::session::SessionContext;
use crate::auth::validate::validate_optional;
use crate::errors::AppError;
use crate::forms::{FormDefinition, WizardSessions};
use crate::local_store::LocalStore;
use crate::models::drafts::{self, DraftStore};

#[derive(Deserialize, Default)]
pub struct SaveDraftBody {
    #[serde(default)]
    pub name: Option<String>,
}

/// Draft store for the signed-in user and form kind `F`.
pub fn user_drafts<F: FormDefinition>(store: &LocalStore, ctx: &SessionContext) -> DraftStore<F> {
    DraftStore::new(store.clone(), ctx.user_id)
}

/// GET /api/{form}/drafts
pub async fn list<F: FormDefinition>(
    session: Session,
    store: web::Data<LocalStore>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let names = user_drafts::<F>(&store, &ctx).names()?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "names": names })))
}

/// POST /api/{form}/drafts: snapshot the current wizard form under the
/// given name, or a generated one.
pub async fn save<F: FormDefinition>(
    session: Session,
    store: web::Data<LocalStore>,
    wizards: web::Data<WizardSessions<F>>,
    body: web::Json<SaveDraftBody>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;

    let name = match body.into_inner().name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => n,
        _ => drafts::generate_name(Local::now().date_naive()),
    };
    if let Some(msg) = validate_optional(&name, "Draft name", 120) {
        return Err(AppError::Validation(vec![msg]));
    }

    let snapshot = wizards.snapshot(ctx.user_id);
    user_drafts::<F>(&store, &ctx)
        .set(&name, snapshot.form())
        .inspect_err(|e| log::error!("Failed to save draft '{name}' for user {}: {e}", ctx.user_id))?;

    wizards.with(ctx.user_id, |w| w.set_draft_name(name.clone()));
    log::info!("User {} saved {} draft '{name}'", ctx.user_id, F::KIND.as_str());
    Ok(HttpResponse::Ok().json(serde_json::json!({ "name": name })))
}

/// POST /api/{form}/drafts/{name}/load
pub async fn load<F: FormDefinition>(
    session: Session,
    store: web::Data<LocalStore>,
    wizards: web::Data<WizardSessions<F>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let name = path.into_inner();

    let form = user_drafts::<F>(&store, &ctx).get(&name)?.ok_or(AppError::NotFound)?;
    Ok(wizards.with(ctx.user_id, |w| {
        w.load_draft(form, name);
        HttpResponse::Ok().json(w.view())
    }))
}

/// DELETE /api/{form}/drafts/{name}
pub async fn delete<F: FormDefinition>(
    session: Session,
    store: web::Data<LocalStore>,
    wizards: web::Data<WizardSessions<F>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let name = path.into_inner();

    if !user_drafts::<F>(&store, &ctx).delete(&name)? {
        return Err(AppError::NotFound);
    }
    wizards.with(ctx.user_id, |w| {
        if w.draft_name() == Some(name.as_str()) {
            w.forget_draft();
        }
    });
    Ok(HttpResponse::NoContent().finish())
}
