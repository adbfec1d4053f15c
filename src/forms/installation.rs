use serde::{Deserialize, Serialize};

use super::common::{Approval, Attendee, ImageCollection, yes_no};
use super::{FormDefinition, FormKind, SectionDef, SectionTable};
use crate::export::document::Table;

pub const SECTIONS: [SectionDef; 9] = [
    SectionDef { id: "site-details", title: "Site Details" },
    SectionDef { id: "team", title: "Installation Team" },
    SectionDef { id: "equipment", title: "Equipment Installed" },
    SectionDef { id: "cabling", title: "Cable Runs" },
    SectionDef { id: "testing", title: "Testing & Commissioning" },
    SectionDef { id: "photos", title: "Photos" },
    SectionDef { id: "drawings", title: "As-built Drawings" },
    SectionDef { id: "outcome", title: "Outcome & Approvals" },
    SectionDef { id: "remarks", title: "Remarks" },
];

/// Installation record form state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallationForm {
    pub site_name: String,
    pub region: String,
    pub date: String,
    pub site_id: String,
    pub site_type: String,
    pub address: String,
    pub gps_coordinates: String,
    pub building_photo: String,
    pub job_reference: String,
    pub start_time: String,
    pub end_time: String,

    pub installation_team: Vec<Attendee>,
    pub equipment_installed: Vec<EquipmentItem>,
    pub cable_runs: Vec<CableRun>,
    pub test_results: TestResults,

    pub before_photos: Vec<String>,
    pub after_photos: Vec<String>,
    pub as_built_drawings: Vec<String>,

    pub contractor_approval: Approval,
    pub engineer_approval: Approval,
    pub representative_approval: Approval,

    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentItem {
    pub description: String,
    pub make_model: String,
    pub serial_number: String,
    pub quantity: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CableRun {
    pub from: String,
    pub to: String,
    pub cable_type: String,
    pub length_m: String,
    pub labelled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestResults {
    pub power_on_verified: bool,
    pub link_test_passed: bool,
    pub optical_loss_db: String,
    pub earth_resistance_ohm: String,
    pub notes: String,
}

impl FormDefinition for InstallationForm {
    const KIND: FormKind = FormKind::Installation;

    fn title() -> &'static str {
        "Installation Record"
    }

    fn sections() -> &'static [SectionDef] {
        &SECTIONS
    }

    fn site_name(&self) -> &str {
        &self.site_name
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn section_tables(&self) -> Vec<SectionTable> {
        let mut tables = Vec::new();

        if !self.installation_team.is_empty() {
            tables.push(SectionTable {
                section: "team",
                table: Table::new(
                    "Installation Team",
                    &["Name", "Company", "Role", "Phone"],
                    self.installation_team
                        .iter()
                        .map(|a| vec![a.name.clone(), a.company.clone(), a.role.clone(), a.phone.clone()])
                        .collect(),
                ),
            });
        }

        if !self.equipment_installed.is_empty() {
            tables.push(SectionTable {
                section: "equipment",
                table: Table::new(
                    "Equipment Installed",
                    &["Description", "Make / Model", "Serial", "Qty", "Location"],
                    self.equipment_installed
                        .iter()
                        .map(|e| {
                            vec![
                                e.description.clone(),
                                e.make_model.clone(),
                                e.serial_number.clone(),
                                e.quantity.clone(),
                                e.location.clone(),
                            ]
                        })
                        .collect(),
                ),
            });
        }

        if !self.cable_runs.is_empty() {
            tables.push(SectionTable {
                section: "cabling",
                table: Table::new(
                    "Cable Runs",
                    &["From", "To", "Type", "Length (m)", "Labelled"],
                    self.cable_runs
                        .iter()
                        .map(|c| {
                            vec![c.from.clone(), c.to.clone(), c.cable_type.clone(), c.length_m.clone(), yes_no(c.labelled)]
                        })
                        .collect(),
                ),
            });
        }

        tables
    }

    fn photo_collections(&self) -> Vec<ImageCollection<'_>> {
        vec![
            ImageCollection::single("Building Photo", &self.building_photo),
            ImageCollection::many("Before Photos", &self.before_photos),
            ImageCollection::many("After Photos", &self.after_photos),
        ]
    }

    fn drawing_collections(&self) -> Vec<ImageCollection<'_>> {
        vec![ImageCollection::many("As-built Drawings", &self.as_built_drawings)]
    }

    fn approvals(&self) -> [(&'static str, &Approval); 3] {
        [
            ("Contractor", &self.contractor_approval),
            ("Engineer", &self.engineer_approval),
            ("Representative", &self.representative_approval),
        ]
    }
}
