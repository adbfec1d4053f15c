//! Admin-configurable form fields.
//!
//! Three independent buckets (assessment, installation, eskomSurvey) each hold
//! an ordered list of section names and the fields tagged with them. Within a
//! section, `order` always equals the field's position: every mutation
//! resequences the affected section to `0..N-1`.
//!
//! The production wizards are typed and do not read this registry; clients
//! that render configurable forms use [`Bucket::active_fields`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::local_store::{LocalStore, StoreError};

pub const SCOPE: &str = "form_field_config";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormBucket {
    #[serde(rename = "assessment")]
    Assessment,
    #[serde(rename = "installation")]
    Installation,
    #[serde(rename = "eskomSurvey")]
    EskomSurvey,
}

impl FormBucket {
    pub const ALL: [FormBucket; 3] = [FormBucket::Assessment, FormBucket::Installation, FormBucket::EskomSurvey];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormBucket::Assessment => "assessment",
            FormBucket::Installation => "installation",
            FormBucket::EskomSurvey => "eskomSurvey",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Select,
    Textarea,
    Checkbox,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    pub section: String,
    pub order: u32,
    pub active: bool,
}

/// Editable part of a field, as submitted by the admin screen.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldDraft {
    fn validate(&self) -> Result<(), RegistryError> {
        if self.label.trim().is_empty() {
            return Err(RegistryError::InvalidField("Field label is required".to_string()));
        }
        if self.input_type == InputType::Select && self.options.iter().all(|o| o.trim().is_empty()) {
            return Err(RegistryError::InvalidField(
                "Select fields need at least one option".to_string(),
            ));
        }
        Ok(())
    }

    fn cleaned_options(&self) -> Vec<String> {
        if self.input_type != InputType::Select {
            return Vec::new();
        }
        self.options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    EmptyName,
    DuplicateSection(String),
    UnknownSection(String),
    SectionInUse { section: String, fields: usize },
    UnknownField(String),
    InvalidField(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyName => write!(f, "Section name is required"),
            RegistryError::DuplicateSection(s) => write!(f, "Section '{s}' already exists"),
            RegistryError::UnknownSection(s) => write!(f, "Section '{s}' does not exist"),
            RegistryError::SectionInUse { section, fields } => write!(
                f,
                "Section '{section}' still has {fields} field(s); move or delete them first"
            ),
            RegistryError::UnknownField(id) => write!(f, "Field '{id}' does not exist"),
            RegistryError::InvalidField(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// One form type's sections and fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bucket {
    pub sections: Vec<String>,
    pub fields: Vec<FieldConfig>,
}

fn new_field_id() -> String {
    let bytes: [u8; 4] = rand::rng().random();
    format!("fld_{}", hex::encode(bytes))
}

impl Bucket {
    pub fn add_section(&mut self, name: &str) -> Result<(), RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.sections.iter().any(|s| s == name) {
            return Err(RegistryError::DuplicateSection(name.to_string()));
        }
        self.sections.push(name.to_string());
        Ok(())
    }

    /// Rejected while any field still references the section.
    pub fn delete_section(&mut self, name: &str) -> Result<(), RegistryError> {
        let pos = self.section_position(name)?;
        let fields = self.fields.iter().filter(|f| f.section == name).count();
        if fields > 0 {
            return Err(RegistryError::SectionInUse { section: name.to_string(), fields });
        }
        self.sections.remove(pos);
        Ok(())
    }

    pub fn move_section(&mut self, name: &str, direction: Direction) -> Result<(), RegistryError> {
        let pos = self.section_position(name)?;
        match direction {
            Direction::Up if pos > 0 => self.sections.swap(pos, pos - 1),
            Direction::Down if pos + 1 < self.sections.len() => self.sections.swap(pos, pos + 1),
            _ => {}
        }
        Ok(())
    }

    /// Append a field to `section`; returns the new field's id.
    pub fn add_field(&mut self, section: &str, draft: &FieldDraft) -> Result<String, RegistryError> {
        self.section_position(section)?;
        draft.validate()?;
        let order = self.fields.iter().filter(|f| f.section == section).count() as u32;
        let id = new_field_id();
        self.fields.push(FieldConfig {
            id: id.clone(),
            input_type: draft.input_type,
            label: draft.label.trim().to_string(),
            placeholder: draft.placeholder.trim().to_string(),
            required: draft.required,
            options: draft.cleaned_options(),
            section: section.to_string(),
            order,
            active: true,
        });
        Ok(id)
    }

    /// Replace a field's editable attributes; section, order and active flag
    /// are kept.
    pub fn update_field(&mut self, id: &str, draft: &FieldDraft) -> Result<(), RegistryError> {
        draft.validate()?;
        let field = self.field_mut(id)?;
        field.input_type = draft.input_type;
        field.label = draft.label.trim().to_string();
        field.placeholder = draft.placeholder.trim().to_string();
        field.required = draft.required;
        field.options = draft.cleaned_options();
        Ok(())
    }

    pub fn delete_field(&mut self, id: &str) -> Result<(), RegistryError> {
        let pos = self
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| RegistryError::UnknownField(id.to_string()))?;
        let removed = self.fields.remove(pos);
        self.resequence(&removed.section);
        Ok(())
    }

    /// Swap with the neighbouring field of the same section; no-op at either
    /// end.
    pub fn move_field(&mut self, id: &str, direction: Direction) -> Result<(), RegistryError> {
        let section = self.field_mut(id)?.section.clone();
        self.resequence(&section);

        let mut indices: Vec<usize> = (0..self.fields.len())
            .filter(|&i| self.fields[i].section == section)
            .collect();
        indices.sort_by_key(|&i| self.fields[i].order);

        let Some(pos) = indices.iter().position(|&i| self.fields[i].id == id) else {
            return Err(RegistryError::UnknownField(id.to_string()));
        };
        let neighbour = match direction {
            Direction::Up if pos > 0 => indices[pos - 1],
            Direction::Down if pos + 1 < indices.len() => indices[pos + 1],
            _ => return Ok(()),
        };
        let current = indices[pos];
        let (a, b) = (self.fields[current].order, self.fields[neighbour].order);
        self.fields[current].order = b;
        self.fields[neighbour].order = a;
        Ok(())
    }

    pub fn toggle_active(&mut self, id: &str, active: bool) -> Result<(), RegistryError> {
        self.field_mut(id)?.active = active;
        Ok(())
    }

    /// Fields of `section` in display order, inactive ones included.
    pub fn fields_in(&self, section: &str) -> Vec<&FieldConfig> {
        let mut fields: Vec<&FieldConfig> = self.fields.iter().filter(|f| f.section == section).collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    /// Active fields grouped by section, in section order.
    pub fn active_fields(&self) -> Vec<(&str, Vec<&FieldConfig>)> {
        self.sections
            .iter()
            .map(|s| {
                let fields = self.fields_in(s).into_iter().filter(|f| f.active).collect();
                (s.as_str(), fields)
            })
            .collect()
    }

    fn section_position(&self, name: &str) -> Result<usize, RegistryError> {
        self.sections
            .iter()
            .position(|s| s == name)
            .ok_or_else(|| RegistryError::UnknownSection(name.to_string()))
    }

    fn field_mut(&mut self, id: &str) -> Result<&mut FieldConfig, RegistryError> {
        self.fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| RegistryError::UnknownField(id.to_string()))
    }

    fn resequence(&mut self, section: &str) {
        let mut indices: Vec<usize> = (0..self.fields.len())
            .filter(|&i| self.fields[i].section == section)
            .collect();
        indices.sort_by_key(|&i| self.fields[i].order);
        for (order, i) in indices.into_iter().enumerate() {
            self.fields[i].order = order as u32;
        }
    }
}

#[derive(Debug)]
pub enum RegistryUpdateError {
    Registry(RegistryError),
    Store(StoreError),
}

impl From<RegistryError> for RegistryUpdateError {
    fn from(e: RegistryError) -> Self {
        RegistryUpdateError::Registry(e)
    }
}

impl From<StoreError> for RegistryUpdateError {
    fn from(e: StoreError) -> Self {
        RegistryUpdateError::Store(e)
    }
}

impl From<RegistryUpdateError> for crate::errors::AppError {
    fn from(e: RegistryUpdateError) -> Self {
        match e {
            RegistryUpdateError::Registry(e) => e.into(),
            RegistryUpdateError::Store(e) => e.into(),
        }
    }
}

/// Registry persisted in the local store, one key per bucket.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    store: LocalStore,
}

impl FieldRegistry {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn load(&self, bucket: FormBucket) -> Result<Bucket, StoreError> {
        Ok(self.store.get(SCOPE, bucket.as_str())?.unwrap_or_default())
    }

    /// Read-modify-write one bucket. Nothing is written when `op` fails.
    pub fn update<R>(
        &self,
        bucket: FormBucket,
        op: impl FnOnce(&mut Bucket) -> Result<R, RegistryError>,
    ) -> Result<(R, Bucket), RegistryUpdateError> {
        let mut current = self.load(bucket)?;
        let result = op(&mut current)?;
        self.store.set(SCOPE, bucket.as_str(), &current)?;
        Ok((result, current))
    }
}
