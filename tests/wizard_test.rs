//! Wizard navigation and repeated-group tests.

mod common;

use serde_json::json;

use fieldops::forms::installation::InstallationForm;
use fieldops::forms::survey::SurveyForm;
use fieldops::forms::{FieldPath, FieldUpdate, FormDefinition, Wizard, WizardSessions};
use common::*;

#[test]
fn test_new_wizard_starts_at_first_section() {
    let wizard = Wizard::<SurveyForm>::new();
    assert_eq!(wizard.active_index(), 0);
    assert_eq!(wizard.active_section().id, "site-identification");
    assert_eq!(wizard.record_id(), None);
    assert_eq!(wizard.draft_name(), None);
}

#[test]
fn test_previous_is_clamped_at_first_section() {
    let mut wizard = Wizard::<SurveyForm>::new();
    let nav = wizard.previous();

    assert_eq!(nav.index, 0);
    assert!(!nav.moved);
    assert!(!nav.scroll_to_top);
}

#[test]
fn test_next_is_clamped_at_last_section() {
    let mut wizard = Wizard::<InstallationForm>::new();
    let total = InstallationForm::sections().len();
    for _ in 0..total + 3 {
        wizard.next();
    }

    assert_eq!(wizard.active_index(), total - 1);
    let nav = wizard.next();
    assert!(!nav.moved);
    assert_eq!(nav.total, total);
}

#[test]
fn test_moving_requests_scroll_to_top() {
    let mut wizard = Wizard::<SurveyForm>::new();
    let nav = wizard.next();

    assert!(nav.moved);
    assert!(nav.scroll_to_top);
    assert_eq!(nav.section, "attendees");
    assert_eq!(nav.index, 1);
}

#[test]
fn test_go_to_by_section_id() {
    let mut wizard = Wizard::<SurveyForm>::new();
    let nav = wizard.go_to("photos").expect("section exists");

    assert_eq!(nav.section, "photos");
    assert_eq!(wizard.active_section().title, "Site Photos");
    assert!(wizard.go_to("nowhere").is_err());
    assert_eq!(wizard.active_section().id, "photos");
}

#[test]
fn test_set_field_keeps_state_on_error() {
    let mut wizard = Wizard::<SurveyForm>::new();
    wizard
        .set_field(&FieldUpdate::new(FieldPath::top("siteName"), json!(SITE_NAME)))
        .expect("update failed");

    let bad = FieldUpdate::new(FieldPath::top("siteName"), json!(42));
    assert!(wizard.set_field(&bad).is_err());
    assert_eq!(wizard.form().site_name, SITE_NAME);
}

#[test]
fn test_load_resets_navigation() {
    let mut wizard = Wizard::<SurveyForm>::new();
    wizard.next();
    wizard.next();

    wizard.load(complete_survey(), Some("Draft_2025-03-14_abc123".into()), Some(4));

    assert_eq!(wizard.active_index(), 0);
    assert_eq!(wizard.form().site_name, SITE_NAME);
    assert_eq!(wizard.draft_name(), Some("Draft_2025-03-14_abc123"));
    assert_eq!(wizard.record_id(), Some(4));
}

#[test]
fn test_loading_a_draft_keeps_the_backend_record() {
    let mut wizard = Wizard::<SurveyForm>::new();
    wizard.set_record_id(5);
    wizard.next();

    wizard.load_draft(complete_survey(), "x");

    assert_eq!(wizard.record_id(), Some(5));
    assert_eq!(wizard.draft_name(), Some("x"));
    assert_eq!(wizard.active_index(), 0);
    assert_eq!(wizard.form().site_name, SITE_NAME);

    let mut fresh = Wizard::<SurveyForm>::new();
    fresh.load_draft(complete_survey(), "y");
    assert_eq!(fresh.record_id(), None);
}

#[test]
fn test_reset_clears_everything() {
    let mut wizard = Wizard::<SurveyForm>::new();
    wizard.load(complete_survey(), Some("d".into()), Some(1));
    wizard.next();

    wizard.reset();

    assert_eq!(wizard.form(), &SurveyForm::default());
    assert_eq!(wizard.active_index(), 0);
    assert_eq!(wizard.record_id(), None);
}

#[test]
fn test_transport_links_are_numbered_from_one() {
    let mut wizard = Wizard::<SurveyForm>::new();
    for _ in 0..3 {
        let update = wizard.form().add_transport_link_update().expect("update");
        wizard.set_field(&update).expect("apply");
    }

    let numbers: Vec<u32> = wizard.form().transport_links.iter().map(|l| l.link_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_removing_a_link_renumbers_the_rest() {
    let mut form = SurveyForm::default();
    for provider in ["A", "B", "C", "D"] {
        let mut links = form.with_new_transport_link();
        if let Some(last) = links.last_mut() {
            last.provider = provider.to_string();
        }
        form.transport_links = links;
    }

    let links = form.without_transport_link(1).expect("index in range");

    let numbers: Vec<u32> = links.iter().map(|l| l.link_number).collect();
    let providers: Vec<&str> = links.iter().map(|l| l.provider.as_str()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(providers, vec!["A", "C", "D"]);
}

#[test]
fn test_removing_a_missing_link_is_an_error() {
    let form = SurveyForm::default();
    assert!(form.without_transport_link(0).is_err());
}

#[test]
fn test_sessions_are_per_user() {
    let sessions = WizardSessions::<SurveyForm>::new();
    sessions.with(ENGINEER_ID, |w| {
        w.set_field(&FieldUpdate::new(FieldPath::top("region"), json!(REGION)))
    })
    .expect("update failed");

    assert_eq!(sessions.snapshot(ENGINEER_ID).form().region, REGION);
    assert_eq!(sessions.snapshot(OTHER_ENGINEER_ID).form().region, "");

    sessions.discard(ENGINEER_ID);
    assert_eq!(sessions.snapshot(ENGINEER_ID).form().region, "");
}
