//! Field update tests: the three path shapes, rejection of bad paths and
//! ill-typed values, and immutability of the input form.

mod common;

use serde_json::json;

use fieldops::forms::survey::{SurveyForm, TransportLink};
use fieldops::forms::update::{self, FieldError, FieldPath, FieldUpdate};
use common::*;

fn set(form: &SurveyForm, path: &str, value: serde_json::Value) -> Result<SurveyForm, FieldError> {
    let update = FieldUpdate::new(FieldPath::parse(path)?, value);
    update::apply(form, &update)
}

#[test]
fn test_top_level_update() {
    let form = SurveyForm::default();
    let updated = set(&form, "siteName", json!(SITE_NAME)).expect("update failed");

    assert_eq!(updated.site_name, SITE_NAME);
    assert_eq!(updated.region, "");
}

#[test]
fn test_nested_update_keeps_siblings() {
    let mut form = SurveyForm::default();
    form.oem_contractor.company = "Acme Fibre".to_string();

    let updated = set(&form, "oemContractor.name", json!("Thandi M")).expect("update failed");

    assert_eq!(updated.oem_contractor.name, "Thandi M");
    assert_eq!(updated.oem_contractor.company, "Acme Fibre");
}

#[test]
fn test_indexed_update_replaces_one_element() {
    let mut form = SurveyForm::default();
    form.additional_drawings = vec!["a".into(), "b".into(), "c".into()];

    let updated = set(&form, "additionalDrawings[1]", json!("B")).expect("update failed");

    assert_eq!(updated.additional_drawings, vec!["a", "B", "c"]);
}

#[test]
fn test_input_form_is_not_mutated() {
    let form = complete_survey();
    let before = form.clone();

    let updated = set(&form, "siteName", json!("Elsewhere")).expect("update failed");

    assert_eq!(form, before);
    assert_ne!(updated, before);
}

#[test]
fn test_unknown_top_level_field_is_rejected() {
    let err = set(&SurveyForm::default(), "noSuchField", json!("x")).unwrap_err();
    assert_eq!(err, FieldError::UnknownField("noSuchField".to_string()));
}

#[test]
fn test_nested_path_into_scalar_is_rejected() {
    let err = set(&SurveyForm::default(), "siteName.first", json!("x")).unwrap_err();
    assert_eq!(err, FieldError::NotAnObject("siteName".to_string()));
}

#[test]
fn test_index_out_of_range_is_rejected() {
    let err = set(&SurveyForm::default(), "sitePhotos[0]", json!("x")).unwrap_err();
    assert_eq!(
        err,
        FieldError::IndexOutOfRange { name: "sitePhotos".to_string(), index: 0, len: 0 }
    );
}

#[test]
fn test_malformed_path_is_rejected_before_lookup() {
    let err = set(&SurveyForm::default(), "a.b.c", json!("x")).unwrap_err();
    assert!(matches!(err, FieldError::InvalidPath(_)));
}

#[test]
fn test_type_mismatch_leaves_form_unchanged() {
    let form = complete_survey();
    let err = set(&form, "followUpRequired", json!("not a bool")).unwrap_err();

    assert!(matches!(err, FieldError::TypeMismatch { .. }));
    assert!(!form.follow_up_required);
}

#[test]
fn test_replace_whole_array() {
    let links = vec![TransportLink { link_number: 1, provider: "Openserve".into(), ..Default::default() }];
    let update = FieldUpdate::replace("transportLinks", &links).expect("replace failed");

    let updated = update::apply(&SurveyForm::default(), &update).expect("update failed");

    assert_eq!(updated.transport_links, links);
}

#[test]
fn test_read_returns_current_value() {
    let form = complete_survey();
    let value = update::read(&form, &FieldPath::top("region")).expect("read failed");
    assert_eq!(value, json!(REGION));
}

#[test]
fn test_field_update_deserializes_from_json() {
    let update: FieldUpdate = serde_json::from_value(json!({
        "path": "oemContractor.phone",
        "value": "011 555 0101",
    }))
    .expect("deserialize failed");

    assert_eq!(
        update.path,
        FieldPath::Nested { parent: "oemContractor".into(), child: "phone".into() }
    );

    let bad = serde_json::from_value::<FieldUpdate>(json!({ "path": "a[x]", "value": 1 }));
    assert!(bad.is_err());
}

#[test]
fn test_indexed_update_does_not_alias_the_prior_array() {
    let mut form = SurveyForm::default();
    form.transport_links = vec![TransportLink { link_number: 1, provider: "Openserve".into(), ..Default::default() }];
    let prior = form.transport_links.clone();

    let updated = set(&form, "transportLinks[0]", json!({ "linkNumber": 1, "provider": "Liquid" }))
        .expect("update failed");

    assert_eq!(form.transport_links, prior);
    assert_eq!(updated.transport_links[0].provider, "Liquid");
}
