use serde::{Deserialize, Serialize};

use crate::auth::validate::{validate_date, validate_optional, validate_required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Allocated,
    InProgress,
    Completed,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Allocated => "allocated",
            AllocationStatus::InProgress => "in_progress",
            AllocationStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allocated" => Some(AllocationStatus::Allocated),
            "in_progress" => Some(AllocationStatus::InProgress),
            "completed" => Some(AllocationStatus::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AllocationStatus::Allocated => "Allocated",
            AllocationStatus::InProgress => "In progress",
            AllocationStatus::Completed => "Completed",
        }
    }

    /// Status moves forward one step at a time.
    pub fn can_move_to(&self, next: AllocationStatus) -> bool {
        matches!(
            (self, next),
            (AllocationStatus::Allocated, AllocationStatus::InProgress)
                | (AllocationStatus::InProgress, AllocationStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub site_code: String,
    pub address: String,
    pub gps_coordinates: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSite {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub site_code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gps_coordinates: String,
}

impl NewSite {
    pub fn validate(&self) -> Vec<String> {
        [
            validate_required(&self.name, "Site name", 200),
            validate_required(&self.region, "Region", 100),
            validate_optional(&self.site_code, "Site code", 50),
            validate_optional(&self.address, "Address", 500),
            validate_optional(&self.gps_coordinates, "GPS coordinates", 100),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Allocation joined with its site and engineer for display.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AllocationView {
    pub id: i64,
    pub site_id: i64,
    pub site_name: String,
    pub region: String,
    pub engineer_id: i64,
    pub engineer_name: String,
    pub status: String,
    pub due_date: String,
    pub notes: String,
    pub updated_at: String,
}

impl AllocationView {
    pub fn status_label(&self) -> &'static str {
        AllocationStatus::parse(&self.status)
            .map(|s| s.label())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAllocation {
    pub site_id: i64,
    pub engineer_id: i64,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub notes: String,
}

impl NewAllocation {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.due_date.trim().is_empty() {
            errors.extend(validate_date(&self.due_date, "Due date"));
        }
        errors.extend(validate_optional(&self.notes, "Notes", 2000));
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: AllocationStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub allocated: i64,
    pub in_progress: i64,
    pub completed: i64,
}
