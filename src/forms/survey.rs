use serde::{Deserialize, Serialize};

use super::common::{Approval, Attendee, ContactDetails, ImageCollection, yes_no};
use super::{FieldError, FieldUpdate, FormDefinition, FormKind, SectionDef, SectionTable};
use crate::export::document::Table;

pub const SECTIONS: [SectionDef; 12] = [
    SectionDef { id: "site-identification", title: "Site Identification" },
    SectionDef { id: "attendees", title: "Attendees" },
    SectionDef { id: "site-contacts", title: "Site Contacts" },
    SectionDef { id: "equipment-room", title: "Equipment Room" },
    SectionDef { id: "transport-links", title: "Transport Links" },
    SectionDef { id: "power-distribution", title: "Power Distribution" },
    SectionDef { id: "charger-circuits", title: "Charger Circuits" },
    SectionDef { id: "odf-cabinets", title: "ODF Cabinets" },
    SectionDef { id: "photos", title: "Site Photos" },
    SectionDef { id: "drawings", title: "Drawings" },
    SectionDef { id: "outcome", title: "Outcome & Approvals" },
    SectionDef { id: "final-notes", title: "Final Notes" },
];

/// Site survey form state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveyForm {
    // Site identification
    pub site_name: String,
    pub region: String,
    pub date: String,
    pub site_id: String,
    pub site_type: String,
    pub address: String,
    pub gps_coordinates: String,
    pub building_photo: String,

    pub attendees: Vec<Attendee>,
    pub oem_contractor: ContactDetails,
    pub site_contacts: Vec<ContactDetails>,

    pub equipment_room: EquipmentRoom,
    pub transport_links: Vec<TransportLink>,
    pub power_distribution: PowerDistribution,
    pub charger_circuits: Vec<ChargerCircuit>,
    pub odf_cabinets: Vec<OdfCabinet>,

    pub site_photos: Vec<String>,
    pub equipment_room_photos: Vec<String>,
    pub power_photos: Vec<String>,
    pub site_layout_drawing: String,
    pub additional_drawings: Vec<String>,

    pub contractor_approval: Approval,
    pub engineer_approval: Approval,
    pub representative_approval: Approval,

    pub general_remarks: String,
    pub follow_up_required: bool,
    pub follow_up_actions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentRoom {
    pub location: String,
    pub floor_level: String,
    pub room_dimensions: String,
    pub available_rack_space_u: String,
    pub access_control: bool,
    pub air_conditioning: bool,
    pub fire_suppression: bool,
    pub lighting_adequate: bool,
    pub condition_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportLink {
    /// Display number, always 1..N in list order.
    pub link_number: u32,
    pub link_type: String,
    pub provider: String,
    pub capacity_mbps: String,
    pub termination_point: String,
    pub fibre_cores: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerDistribution {
    pub supply_type: String,
    pub supply_voltage: String,
    pub main_breaker_rating_a: String,
    pub db_location: String,
    pub earthing_verified: bool,
    pub ups_present: bool,
    pub ups_capacity_kva: String,
    pub generator_present: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargerCircuit {
    pub circuit_id: String,
    pub breaker_rating_a: String,
    pub cable_size_mm2: String,
    pub cable_length_m: String,
    pub phase: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OdfCabinet {
    pub cabinet_id: String,
    pub location: String,
    pub port_count: String,
    pub ports_used: String,
    pub notes: String,
}

/// Renumber links 1..N in their current order.
pub fn renumber_links(links: &mut [TransportLink]) {
    for (i, link) in links.iter_mut().enumerate() {
        link.link_number = (i + 1) as u32;
    }
}

impl SurveyForm {
    /// Links with `index` removed and the rest renumbered.
    pub fn without_transport_link(&self, index: usize) -> Result<Vec<TransportLink>, FieldError> {
        if index >= self.transport_links.len() {
            return Err(FieldError::IndexOutOfRange {
                name: "transportLinks".to_string(),
                index,
                len: self.transport_links.len(),
            });
        }
        let mut links = self.transport_links.clone();
        links.remove(index);
        renumber_links(&mut links);
        Ok(links)
    }

    /// Links with a blank link appended, numbered after the last one.
    pub fn with_new_transport_link(&self) -> Vec<TransportLink> {
        let mut links = self.transport_links.clone();
        links.push(TransportLink::default());
        renumber_links(&mut links);
        links
    }

    pub fn remove_transport_link_update(&self, index: usize) -> Result<FieldUpdate, FieldError> {
        FieldUpdate::replace("transportLinks", &self.without_transport_link(index)?)
    }

    pub fn add_transport_link_update(&self) -> Result<FieldUpdate, FieldError> {
        FieldUpdate::replace("transportLinks", &self.with_new_transport_link())
    }
}

impl FormDefinition for SurveyForm {
    const KIND: FormKind = FormKind::Survey;

    fn title() -> &'static str {
        "Site Survey"
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

        if !self.attendees.is_empty() {
            tables.push(SectionTable {
                section: "attendees",
                table: Table::new(
                    "Attendees",
                    &["Name", "Company", "Role", "Phone", "Email"],
                    self.attendees
                        .iter()
                        .map(|a| vec![a.name.clone(), a.company.clone(), a.role.clone(), a.phone.clone(), a.email.clone()])
                        .collect(),
                ),
            });
        }

        if !self.site_contacts.is_empty() {
            tables.push(SectionTable {
                section: "site-contacts",
                table: Table::new(
                    "Site Contacts",
                    &["Name", "Company", "Phone", "Email"],
                    self.site_contacts
                        .iter()
                        .map(|c| vec![c.name.clone(), c.company.clone(), c.phone.clone(), c.email.clone()])
                        .collect(),
                ),
            });
        }

        if !self.transport_links.is_empty() {
            tables.push(SectionTable {
                section: "transport-links",
                table: Table::new(
                    "Transport Links",
                    &["#", "Type", "Provider", "Capacity (Mbps)", "Termination", "Fibre cores"],
                    self.transport_links
                        .iter()
                        .map(|l| {
                            vec![
                                l.link_number.to_string(),
                                l.link_type.clone(),
                                l.provider.clone(),
                                l.capacity_mbps.clone(),
                                l.termination_point.clone(),
                                l.fibre_cores.clone(),
                            ]
                        })
                        .collect(),
                ),
            });
        }

        if !self.charger_circuits.is_empty() {
            tables.push(SectionTable {
                section: "charger-circuits",
                table: Table::new(
                    "Charger Circuits",
                    &["Circuit", "Breaker (A)", "Cable (mm2)", "Length (m)", "Phase"],
                    self.charger_circuits
                        .iter()
                        .map(|c| {
                            vec![
                                c.circuit_id.clone(),
                                c.breaker_rating_a.clone(),
                                c.cable_size_mm2.clone(),
                                c.cable_length_m.clone(),
                                c.phase.clone(),
                            ]
                        })
                        .collect(),
                ),
            });
        }

        if !self.odf_cabinets.is_empty() {
            tables.push(SectionTable {
                section: "odf-cabinets",
                table: Table::new(
                    "ODF Cabinets",
                    &["Cabinet", "Location", "Ports", "Used", "Notes"],
                    self.odf_cabinets
                        .iter()
                        .map(|o| {
                            vec![
                                o.cabinet_id.clone(),
                                o.location.clone(),
                                o.port_count.clone(),
                                o.ports_used.clone(),
                                o.notes.clone(),
                            ]
                        })
                        .collect(),
                ),
            });
        }

        if self.follow_up_required {
            tables.push(SectionTable {
                section: "final-notes",
                table: Table::new(
                    "Follow-up",
                    &["Required", "Actions"],
                    vec![vec![yes_no(true), self.follow_up_actions.clone()]],
                ),
            });
        }

        tables
    }

    fn photo_collections(&self) -> Vec<ImageCollection<'_>> {
        vec![
            ImageCollection::single("Building Photo", &self.building_photo),
            ImageCollection::many("Site Photos", &self.site_photos),
            ImageCollection::many("Equipment Room Photos", &self.equipment_room_photos),
            ImageCollection::many("Power Photos", &self.power_photos),
        ]
    }

    fn drawing_collections(&self) -> Vec<ImageCollection<'_>> {
        vec![
            ImageCollection::single("Site Layout Drawing", &self.site_layout_drawing),
            ImageCollection::many("Additional Drawings", &self.additional_drawings),
        ]
    }

    fn approvals(&self) -> [(&'static str, &Approval); 3] {
        [
            ("Contractor", &self.contractor_approval),
            ("Engineer", &self.engineer_approval),
            ("Representative", &self.representative_approval),
        ]
    }
}
