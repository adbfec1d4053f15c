use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::{SessionContext, set_flash};
use crate::errors::AppError;
use crate::forms::{FormDefinition, WizardSessions};
use crate::handlers::draft_handlers::user_drafts;
use crate::handlers::feed_handlers::{FeedHub, RECORDS_CHANGED, broadcast};
use crate::local_store::LocalStore;
use crate::models::record::{self, PgRecordStore, RecordStore};
use crate::submission::{self, SaveMode, SaveOutcome, SaveRequest};

/// After a stored save: open dashboards re-fetch, and a submit leaves a
/// confirmation for the page the client is redirected to.
pub fn announce_saved<F: FormDefinition>(session: &Session, hub: &FeedHub, outcome: &SaveOutcome) {
    if outcome.redirect.is_some() {
        set_flash(session, &format!("{} for record #{} submitted.", F::title(), outcome.record_id));
    }
    broadcast(hub, RECORDS_CHANGED);
}

async fn save_with_mode<F: FormDefinition>(
    mode: SaveMode,
    session: &Session,
    store: &PgRecordStore,
    local: &LocalStore,
    wizards: &WizardSessions<F>,
    hub: &FeedHub,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(session)?;
    let wizard = wizards.snapshot(ctx.user_id);

    if let Some(id) = wizard.record_id() {
        let existing = store.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if !ctx.can_edit(existing.owner_id) {
            return Err(AppError::PermissionDenied(format!("record {id}")));
        }
    }

    let drafts = user_drafts::<F>(local, &ctx);
    let outcome = submission::save(
        store,
        &drafts,
        SaveRequest {
            form: wizard.form(),
            mode,
            existing_id: wizard.record_id(),
            draft_name: wizard.draft_name(),
            owner_id: ctx.user_id,
        },
    )
    .await?;

    match mode {
        SaveMode::Draft => wizards.with(ctx.user_id, |w| w.set_record_id(outcome.record_id)),
        // The user leaves the edit view after submitting.
        SaveMode::Submitted => wizards.discard(ctx.user_id),
    }
    announce_saved::<F>(session, hub, &outcome);

    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/{form}/save
pub async fn save<F: FormDefinition>(
    session: Session,
    store: web::Data<PgRecordStore>,
    local: web::Data<LocalStore>,
    wizards: web::Data<WizardSessions<F>>,
    hub: web::Data<FeedHub>,
) -> Result<HttpResponse, AppError> {
    save_with_mode(SaveMode::Draft, &session, &store, &local, &wizards, &hub).await
}

/// POST /api/{form}/submit
pub async fn submit<F: FormDefinition>(
    session: Session,
    store: web::Data<PgRecordStore>,
    local: web::Data<LocalStore>,
    wizards: web::Data<WizardSessions<F>>,
    hub: web::Data<FeedHub>,
) -> Result<HttpResponse, AppError> {
    save_with_mode(SaveMode::Submitted, &session, &store, &local, &wizards, &hub).await
}

async fn open_into_wizard<F: FormDefinition>(
    session: &Session,
    store: &PgRecordStore,
    wizards: &WizardSessions<F>,
    id: i64,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(session)?;

    let stored = store.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    if !ctx.can_edit(stored.owner_id) {
        return Err(AppError::PermissionDenied(format!("record {id}")));
    }
    if stored.form_type != F::KIND.as_str() {
        return Err(AppError::NotFound);
    }
    let form: F = record::form_from_record(&stored)?;

    Ok(wizards.with(ctx.user_id, |w| {
        w.load(form, None, Some(id));
        HttpResponse::Ok().json(w.view())
    }))
}

/// POST /api/{form}/records/{id}/open: load a stored record into the
/// caller's wizard so later saves update it in place.
pub async fn open_record<F: FormDefinition>(
    session: Session,
    store: web::Data<PgRecordStore>,
    wizards: web::Data<WizardSessions<F>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    open_into_wizard(&session, &store, &wizards, path.into_inner()).await
}

/// GET /{form}/records/{id}: the edit location handed out after a save.
/// Reloading it restores the edit session on that record.
pub async fn resume_record<F: FormDefinition>(
    session: Session,
    store: web::Data<PgRecordStore>,
    wizards: web::Data<WizardSessions<F>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    open_into_wizard(&session, &store, &wizards, path.into_inner()).await
}
