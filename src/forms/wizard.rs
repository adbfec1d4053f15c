use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::update::{self, FieldError, FieldUpdate};
use super::{FormDefinition, SectionDef};

/// Multi-section wizard over one form value.
///
/// The form is only ever replaced wholesale by the result of
/// [`update::apply`]; a rejected update leaves it as it was.
#[derive(Debug, Clone, Default)]
pub struct Wizard<F> {
    form: F,
    active: usize,
    record_id: Option<i64>,
    draft_name: Option<String>,
}

/// Result of a navigation step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub section: &'static str,
    pub title: &'static str,
    pub index: usize,
    pub total: usize,
    pub moved: bool,
    pub scroll_to_top: bool,
}

/// Serializable view of a wizard for the JSON API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView<'a, F> {
    pub title: &'static str,
    pub sections: &'static [SectionDef],
    pub active_section: &'static str,
    pub active_index: usize,
    pub record_id: Option<i64>,
    pub draft_name: Option<&'a str>,
    pub form: &'a F,
}

impl<F: FormDefinition> Wizard<F> {
    pub fn new() -> Self {
        Self {
            form: F::default(),
            active: 0,
            record_id: None,
            draft_name: None,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_section(&self) -> &'static SectionDef {
        &F::sections()[self.active]
    }

    pub fn record_id(&self) -> Option<i64> {
        self.record_id
    }

    pub fn set_record_id(&mut self, id: i64) {
        self.record_id = Some(id);
    }

    pub fn draft_name(&self) -> Option<&str> {
        self.draft_name.as_deref()
    }

    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        self.draft_name = Some(name.into());
    }

    pub fn forget_draft(&mut self) {
        self.draft_name = None;
    }

    pub fn set_field(&mut self, update: &FieldUpdate) -> Result<(), FieldError> {
        self.form = update::apply(&self.form, update)?;
        Ok(())
    }

    /// Replace the whole form, e.g. from a draft or a backend record.
    /// Navigation returns to the first section.
    pub fn load(&mut self, form: F, draft_name: Option<String>, record_id: Option<i64>) {
        self.form = form;
        self.draft_name = draft_name;
        self.record_id = record_id;
        self.active = 0;
    }

    /// Load a named draft into this wizard. A record already saved to the
    /// backend from this wizard stays attached, so the next save updates it.
    pub fn load_draft(&mut self, form: F, draft_name: impl Into<String>) {
        let record_id = self.record_id;
        self.load(form, Some(draft_name.into()), record_id);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn next(&mut self) -> Navigation {
        let last = F::sections().len() - 1;
        let target = (self.active + 1).min(last);
        self.move_to(target)
    }

    pub fn previous(&mut self) -> Navigation {
        let target = self.active.saturating_sub(1);
        self.move_to(target)
    }

    pub fn go_to(&mut self, section_id: &str) -> Result<Navigation, FieldError> {
        let target = F::sections()
            .iter()
            .position(|s| s.id == section_id)
            .ok_or_else(|| FieldError::UnknownSection(section_id.to_string()))?;
        Ok(self.move_to(target))
    }

    fn move_to(&mut self, target: usize) -> Navigation {
        let moved = target != self.active;
        self.active = target;
        let section = self.active_section();
        Navigation {
            section: section.id,
            title: section.title,
            index: self.active,
            total: F::sections().len(),
            moved,
            scroll_to_top: moved,
        }
    }

    pub fn view(&self) -> WizardView<'_, F> {
        WizardView {
            title: F::title(),
            sections: F::sections(),
            active_section: self.active_section().id,
            active_index: self.active,
            record_id: self.record_id,
            draft_name: self.draft_name.as_deref(),
            form: &self.form,
        }
    }
}

/// Per-user wizards for one form kind, shared across workers.
pub struct WizardSessions<F> {
    inner: Arc<RwLock<HashMap<i64, Wizard<F>>>>,
}

impl<F> Clone for WizardSessions<F> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<F: FormDefinition> Default for WizardSessions<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FormDefinition> WizardSessions<F> {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Run `f` against the user's wizard, creating a fresh one if needed.
    pub fn with<R>(&self, user_id: i64, f: impl FnOnce(&mut Wizard<F>) -> R) -> R {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(map.entry(user_id).or_insert_with(Wizard::new))
    }

    /// Clone of the user's current wizard.
    pub fn snapshot(&self, user_id: i64) -> Wizard<F> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(&user_id).cloned().unwrap_or_else(Wizard::new)
    }

    pub fn discard(&self, user_id: i64) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(&user_id);
    }
}
