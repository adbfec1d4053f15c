use actix_session::Session;
use actix_web::{HttpResponse, http::header, web};

use crate::auth::session::SessionContext;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::export::html::render_html;
use crate::export::{PdfSettings, build_document, export_filename, render_pdf};
use crate::forms::{FormDefinition, FormKind, InstallationForm, SurveyForm, WizardSessions};
use crate::models::record::{self, FormRecord, PgRecordStore, RecordStore};

async fn pdf_response<F: FormDefinition>(form: &F, org_name: &str) -> Result<HttpResponse, AppError> {
    let doc = build_document(form, org_name);
    // Image decoding and page layout are CPU bound.
    let bytes = web::block(move || {
        render_pdf(&doc, &PdfSettings::default())
            .inspect_err(|e| log::error!("PDF export failed for '{}': {e}", doc.site_name))
    })
    .await??;
    let filename = export_filename(form.site_name(), F::KIND.as_str(), "pdf");

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes))
}

/// GET /{form}/export.pdf: the caller's current wizard form.
pub async fn pdf<F: FormDefinition>(
    session: Session,
    config: web::Data<AppConfig>,
    wizards: web::Data<WizardSessions<F>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let wizard = wizards.snapshot(ctx.user_id);
    pdf_response(wizard.form(), &config.org_name).await
}

/// GET /{form}/export.html: print-friendly page of the current form.
pub async fn html<F: FormDefinition>(
    session: Session,
    config: web::Data<AppConfig>,
    wizards: web::Data<WizardSessions<F>>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let wizard = wizards.snapshot(ctx.user_id);
    let doc = build_document(wizard.form(), &config.org_name);
    let page = render_html(&doc)?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page))
}

async fn record_pdf<F: FormDefinition>(stored: &FormRecord, org_name: &str) -> Result<HttpResponse, AppError> {
    let form: F = record::form_from_record(stored)?;
    pdf_response(&form, org_name).await
}

/// GET /records/{id}/export.pdf: any stored record the caller may see.
pub async fn stored_record_pdf(
    session: Session,
    config: web::Data<AppConfig>,
    store: web::Data<PgRecordStore>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let ctx = SessionContext::require(&session)?;
    let id = path.into_inner();
    let stored = store.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    if !ctx.can_edit(stored.owner_id) {
        return Err(AppError::PermissionDenied(format!("record {id}")));
    }

    match FormKind::parse(&stored.form_type) {
        Some(FormKind::Survey) => record_pdf::<SurveyForm>(&stored, &config.org_name).await,
        Some(FormKind::Installation) => record_pdf::<InstallationForm>(&stored, &config.org_name).await,
        None => {
            log::error!("Record {id} has unknown form type '{}'", stored.form_type);
            Err(AppError::NotFound)
        }
    }
}
