pub mod admin;
pub mod auth_handlers;
pub mod capture_handlers;
pub mod dashboard;
pub mod draft_handlers;
pub mod export_handlers;
pub mod feed_handlers;
pub mod submission_handlers;
pub mod wizard_handlers;

use actix_web::{Scope, web};

use crate::forms::FormDefinition;

/// JSON wizard, draft and record routes for one form kind. Mounted inside
/// the `/api` scope as `/surveys` or `/installations`.
pub fn form_api<F: FormDefinition>() -> Scope {
    web::scope(&format!("/{}", F::KIND.route()))
        // Wizard state machine
        .route("/wizard", web::get().to(wizard_handlers::view::<F>))
        .route("/wizard/reset", web::post().to(wizard_handlers::reset::<F>))
        .route("/wizard/field", web::post().to(wizard_handlers::set_field::<F>))
        .route("/wizard/next", web::post().to(wizard_handlers::next::<F>))
        .route("/wizard/previous", web::post().to(wizard_handlers::previous::<F>))
        .route("/wizard/goto/{section}", web::post().to(wizard_handlers::go_to::<F>))
        // Drafts
        .route("/drafts", web::get().to(draft_handlers::list::<F>))
        .route("/drafts", web::post().to(draft_handlers::save::<F>))
        .route("/drafts/{name}/load", web::post().to(draft_handlers::load::<F>))
        .route("/drafts/{name}", web::delete().to(draft_handlers::delete::<F>))
        // Backend records
        .route("/save", web::post().to(submission_handlers::save::<F>))
        .route("/submit", web::post().to(submission_handlers::submit::<F>))
        .route("/records/{id}/open", web::post().to(submission_handlers::open_record::<F>))
}

/// Page-level routes for one form kind, mounted under
/// `/{surveys|installations}`: print exports of the current wizard form and
/// the record edit location returned by saves.
pub fn form_exports<F: FormDefinition>() -> Scope {
    web::scope(&format!("/{}", F::KIND.route()))
        .route("/records/{id}", web::get().to(submission_handlers::resume_record::<F>))
        .route("/export.pdf", web::get().to(export_handlers::pdf::<F>))
        .route("/export.html", web::get().to(export_handlers::html::<F>))
}
