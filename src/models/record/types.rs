use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;

use crate::forms::{FieldError, FormDefinition, FormKind};

/// Form keys mirrored into indexed columns, in column order.
pub const PROMOTED: [&str; 8] = [
    "siteName",
    "region",
    "date",
    "siteId",
    "siteType",
    "address",
    "gpsCoordinates",
    "buildingPhoto",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Draft,
    Submitted,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Submitted => "submitted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(RecordStatus::Draft),
            "submitted" => Some(RecordStatus::Submitted),
            _ => None,
        }
    }
}

/// Promoted column values, as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromotedColumns {
    pub site_name: String,
    pub region: String,
    pub survey_date: String,
    pub site_id: String,
    pub site_type: String,
    pub address: String,
    pub gps_coordinates: String,
    pub building_photo: String,
}

impl PromotedColumns {
    fn values(&self) -> [&String; 8] {
        [
            &self.site_name,
            &self.region,
            &self.survey_date,
            &self.site_id,
            &self.site_type,
            &self.address,
            &self.gps_coordinates,
            &self.building_photo,
        ]
    }

    fn slots(&mut self) -> [&mut String; 8] {
        [
            &mut self.site_name,
            &mut self.region,
            &mut self.survey_date,
            &mut self.site_id,
            &mut self.site_type,
            &mut self.address,
            &mut self.gps_coordinates,
            &mut self.building_photo,
        ]
    }
}

/// Write payload for insert and update: same shape either way.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFormRecord {
    pub form_type: FormKind,
    pub status: RecordStatus,
    pub owner_id: i64,
    pub columns: PromotedColumns,
    pub data: Value,
}

/// Full stored record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FormRecord {
    pub id: i64,
    pub form_type: String,
    pub status: String,
    pub owner_id: i64,
    pub site_name: String,
    pub region: String,
    pub survey_date: String,
    pub site_id: String,
    pub site_type: String,
    pub address: String,
    pub gps_coordinates: String,
    pub building_photo: String,
    pub data: Json<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl FormRecord {
    pub fn columns(&self) -> PromotedColumns {
        PromotedColumns {
            site_name: self.site_name.clone(),
            region: self.region.clone(),
            survey_date: self.survey_date.clone(),
            site_id: self.site_id.clone(),
            site_type: self.site_type.clone(),
            address: self.address.clone(),
            gps_coordinates: self.gps_coordinates.clone(),
            building_photo: self.building_photo.clone(),
        }
    }
}

/// List row for dashboards and review screens.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecordSummary {
    pub id: i64,
    pub form_type: String,
    pub status: String,
    pub owner_id: i64,
    pub owner_name: String,
    pub site_name: String,
    pub region: String,
    pub survey_date: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    pub form_type: Option<FormKind>,
    pub status: Option<RecordStatus>,
    /// Case-insensitive substring of the site name.
    pub site: Option<String>,
    pub owner_id: Option<i64>,
    pub limit: Option<i64>,
}

impl RecordFilter {
    pub fn matches(&self, record: &FormRecord) -> bool {
        self.form_type.is_none_or(|k| record.form_type == k.as_str())
            && self.status.is_none_or(|s| record.status == s.as_str())
            && self.owner_id.is_none_or(|o| record.owner_id == o)
            && self.site_needle().is_none_or(|needle| {
                record.site_name.to_lowercase().contains(&needle.to_lowercase())
            })
    }

    /// The trimmed site filter; blank means no filter.
    pub fn site_needle(&self) -> Option<&str> {
        self.site.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// `ILIKE` pattern for the site filter, with `\`, `%` and `_` escaped so
    /// they match literally.
    pub fn site_pattern(&self) -> Option<String> {
        self.site_needle().map(|needle| {
            let mut pattern = String::with_capacity(needle.len() + 2);
            pattern.push('%');
            for c in needle.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

fn field_error(reason: impl ToString) -> FieldError {
    FieldError::TypeMismatch { path: String::new(), reason: reason.to_string() }
}

/// Split `form` into promoted columns and the opaque remainder.
pub fn split<F: FormDefinition>(
    form: &F,
    status: RecordStatus,
    owner_id: i64,
) -> Result<NewFormRecord, FieldError> {
    let mut doc = match serde_json::to_value(form).map_err(field_error)? {
        Value::Object(map) => map,
        _ => return Err(FieldError::NotAnObject("form".to_string())),
    };

    let mut columns = PromotedColumns::default();
    for (key, slot) in PROMOTED.iter().zip(columns.slots()) {
        if let Some(value) = doc.remove(*key) {
            *slot = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
        }
    }

    Ok(NewFormRecord {
        form_type: F::KIND,
        status,
        owner_id,
        columns,
        data: Value::Object(doc),
    })
}

/// Rebuild a form from promoted columns and the remainder blob.
pub fn merge<F: FormDefinition>(columns: &PromotedColumns, data: &Value) -> Result<F, FieldError> {
    let mut doc = match data {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => return Err(FieldError::NotAnObject("data".to_string())),
    };
    for (key, value) in PROMOTED.iter().zip(columns.values()) {
        doc.insert(key.to_string(), Value::String(value.clone()));
    }
    serde_json::from_value(Value::Object(doc)).map_err(field_error)
}

/// Load the form held by a stored record, checking its form type.
pub fn form_from_record<F: FormDefinition>(record: &FormRecord) -> Result<F, FieldError> {
    if record.form_type != F::KIND.as_str() {
        return Err(FieldError::TypeMismatch {
            path: String::new(),
            reason: format!("record {} is a {} record", record.id, record.form_type),
        });
    }
    merge(&record.columns(), &record.data.0)
}
