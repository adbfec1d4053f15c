//! Saving a form to the backend record store.
//!
//! A save either inserts (no record yet) or updates by id, with the same
//! payload shape. Submitting additionally validates the required site fields
//! first and, once the write succeeds, deletes the draft the form came from.
//! Any failure leaves both the form and its draft untouched, so the caller
//! can simply retry.

use serde::{Deserialize, Serialize};

use crate::auth::validate::{validate_date, validate_required};
use crate::errors::AppError;
use crate::forms::FormDefinition;
use crate::models::drafts::DraftStore;
use crate::models::record::{self, RecordStatus, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    Draft,
    Submitted,
}

impl SaveMode {
    pub fn status(&self) -> RecordStatus {
        match self {
            SaveMode::Draft => RecordStatus::Draft,
            SaveMode::Submitted => RecordStatus::Submitted,
        }
    }
}

pub struct SaveRequest<'a, F> {
    pub form: &'a F,
    pub mode: SaveMode,
    pub existing_id: Option<i64>,
    /// Draft the form was saved as or loaded from, if any.
    pub draft_name: Option<&'a str>,
    pub owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub record_id: i64,
    pub created: bool,
    pub status: RecordStatus,
    /// Addressable edit location for the record.
    pub location: String,
    /// Where to send the user next, set after a submit.
    pub redirect: Option<String>,
    pub draft_deleted: bool,
}

/// Required fields that are missing or malformed, by display name.
pub fn missing_required<F: FormDefinition>(form: &F) -> Vec<String> {
    [
        validate_required(form.site_name(), "Site name", 200),
        validate_date(form.date(), "Date"),
        validate_required(form.region(), "Region", 100),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn record_location<F: FormDefinition>(id: i64) -> String {
    format!("/{}/records/{id}", F::KIND.route())
}

pub async fn save<F, S>(
    store: &S,
    drafts: &DraftStore<F>,
    req: SaveRequest<'_, F>,
) -> Result<SaveOutcome, AppError>
where
    F: FormDefinition,
    S: RecordStore,
{
    if req.mode == SaveMode::Submitted {
        let missing = missing_required(req.form);
        if !missing.is_empty() {
            return Err(AppError::Incomplete(missing));
        }
    }

    let payload = record::split(req.form, req.mode.status(), req.owner_id)?;

    let (record_id, created) = match req.existing_id {
        Some(id) => {
            store.update(id, &payload).await.inspect_err(|e| {
                log::error!("Failed to update {} record {id}: {e}", F::KIND.as_str());
            })?;
            (id, false)
        }
        None => {
            let id = store.insert(&payload).await.inspect_err(|e| {
                log::error!("Failed to insert {} record: {e}", F::KIND.as_str());
            })?;
            (id, true)
        }
    };

    log::info!(
        "Saved {} record {record_id} as {} (user {})",
        F::KIND.as_str(),
        payload.status.as_str(),
        req.owner_id
    );

    let mut outcome = SaveOutcome {
        record_id,
        created,
        status: payload.status,
        location: record_location::<F>(record_id),
        redirect: None,
        draft_deleted: false,
    };

    if req.mode == SaveMode::Submitted {
        if let Some(name) = req.draft_name {
            match drafts.delete(name) {
                Ok(true) => outcome.draft_deleted = true,
                Ok(false) => log::warn!("Submitted draft '{name}' was already gone"),
                Err(e) => log::warn!("Record {record_id} submitted but draft '{name}' was not removed: {e}"),
            }
        }
        outcome.redirect = Some("/dashboard".to_string());
    }

    Ok(outcome)
}
