//! Typed form definitions shared by the wizard, draft store, submission
//! pipeline and export.

use serde::{Serialize, de::DeserializeOwned};

pub mod common;
pub mod installation;
pub mod survey;
pub mod update;
pub mod wizard;

pub use self::common::{Approval, Attendee, ContactDetails, ImageCollection};
pub use self::installation::InstallationForm;
pub use self::survey::SurveyForm;
pub use self::update::{FieldError, FieldPath, FieldUpdate};
pub use self::wizard::{Navigation, Wizard, WizardSessions};

use crate::export::document::Table;

/// The two production form kinds. Each has its own draft scope and its own
/// `form_type` value on backend records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Survey,
    Installation,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Survey => "survey",
            FormKind::Installation => "installation",
        }
    }

    /// URL segment used for this kind's routes.
    pub fn route(&self) -> &'static str {
        match self {
            FormKind::Survey => "surveys",
            FormKind::Installation => "installations",
        }
    }

    pub fn draft_scope(&self) -> &'static str {
        match self {
            FormKind::Survey => "survey_drafts",
            FormKind::Installation => "installation_drafts",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "survey" => Some(FormKind::Survey),
            "installation" => Some(FormKind::Installation),
            _ => None,
        }
    }
}

/// One wizard section: a stable identifier plus its display title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionDef {
    pub id: &'static str,
    pub title: &'static str,
}

/// A repeated-group table belonging to one wizard section, used by export.
pub struct SectionTable {
    pub section: &'static str,
    pub table: Table,
}

/// Implemented by every production form. The JSON representation (camelCase
/// keys) is the addressing surface for `FieldPath`.
pub trait FormDefinition:
    Serialize + DeserializeOwned + Clone + Default + PartialEq + Send + Sync + 'static
{
    const KIND: FormKind;

    fn title() -> &'static str;

    fn sections() -> &'static [SectionDef];

    fn site_name(&self) -> &str;

    fn region(&self) -> &str;

    fn date(&self) -> &str;

    fn section_tables(&self) -> Vec<SectionTable>;

    fn photo_collections(&self) -> Vec<ImageCollection<'_>>;

    fn drawing_collections(&self) -> Vec<ImageCollection<'_>>;

    /// Contractor, engineer and representative approvals, in that order.
    fn approvals(&self) -> [(&'static str, &Approval); 3];
}
