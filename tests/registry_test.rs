//! Field registry tests: section guards, ordering and persistence.

mod common;

use fieldops::models::field_registry::{
    Bucket, Direction, FieldDraft, FieldRegistry, FormBucket, InputType, RegistryError,
};
use common::*;

fn text_field(label: &str) -> FieldDraft {
    FieldDraft {
        input_type: InputType::Text,
        label: label.to_string(),
        placeholder: String::new(),
        required: false,
        options: Vec::new(),
    }
}

fn orders(bucket: &Bucket, section: &str) -> Vec<(String, u32)> {
    bucket
        .fields_in(section)
        .into_iter()
        .map(|f| (f.label.clone(), f.order))
        .collect()
}

fn bucket_with_fields(labels: &[&str]) -> (Bucket, Vec<String>) {
    let mut bucket = Bucket::default();
    bucket.add_section("Power").expect("add section");
    let ids = labels
        .iter()
        .map(|l| bucket.add_field("Power", &text_field(l)).expect("add field"))
        .collect();
    (bucket, ids)
}

#[test]
fn test_add_section_rejects_blank_and_duplicates() {
    let mut bucket = Bucket::default();
    bucket.add_section("Power").expect("add section");

    assert_eq!(bucket.add_section("  "), Err(RegistryError::EmptyName));
    assert_eq!(
        bucket.add_section("Power"),
        Err(RegistryError::DuplicateSection("Power".to_string()))
    );
    assert_eq!(bucket.sections, vec!["Power"]);
}

#[test]
fn test_section_with_fields_cannot_be_deleted() {
    let (mut bucket, _) = bucket_with_fields(&["Supply voltage", "Breaker"]);

    assert_eq!(
        bucket.delete_section("Power"),
        Err(RegistryError::SectionInUse { section: "Power".to_string(), fields: 2 })
    );
    assert_eq!(bucket.sections, vec!["Power"]);
}

#[test]
fn test_empty_section_can_be_deleted() {
    let mut bucket = Bucket::default();
    bucket.add_section("Spare").expect("add section");
    bucket.delete_section("Spare").expect("delete section");
    assert!(bucket.sections.is_empty());
}

#[test]
fn test_new_fields_get_sequential_order_and_unique_ids() {
    let (bucket, ids) = bucket_with_fields(&["A", "B", "C"]);

    assert_eq!(orders(&bucket, "Power"), vec![("A".into(), 0), ("B".into(), 1), ("C".into(), 2)]);
    assert!(ids.iter().all(|id| id.starts_with("fld_")));
    assert_ne!(ids[0], ids[1]);
    assert!(bucket.fields.iter().all(|f| f.active));
}

#[test]
fn test_add_field_to_unknown_section_fails() {
    let mut bucket = Bucket::default();
    assert_eq!(
        bucket.add_field("Nowhere", &text_field("X")),
        Err(RegistryError::UnknownSection("Nowhere".to_string()))
    );
}

#[test]
fn test_select_needs_options() {
    let (mut bucket, _) = bucket_with_fields(&[]);
    let mut draft = text_field("Phase");
    draft.input_type = InputType::Select;
    draft.options = vec!["  ".to_string()];

    assert!(matches!(bucket.add_field("Power", &draft), Err(RegistryError::InvalidField(_))));

    draft.options = vec![" L1 ".into(), "".into(), "L2".into()];
    let id = bucket.add_field("Power", &draft).expect("add field");
    let field = bucket.fields.iter().find(|f| f.id == id).expect("field");
    assert_eq!(field.options, vec!["L1", "L2"]);
}

#[test]
fn test_delete_field_resequences() {
    let (mut bucket, ids) = bucket_with_fields(&["A", "B", "C", "D"]);

    bucket.delete_field(&ids[1]).expect("delete");

    assert_eq!(orders(&bucket, "Power"), vec![("A".into(), 0), ("C".into(), 1), ("D".into(), 2)]);
}

#[test]
fn test_move_field_swaps_with_neighbour() {
    let (mut bucket, ids) = bucket_with_fields(&["A", "B", "C"]);

    bucket.move_field(&ids[2], Direction::Up).expect("move");

    assert_eq!(orders(&bucket, "Power"), vec![("A".into(), 0), ("C".into(), 1), ("B".into(), 2)]);
}

#[test]
fn test_move_field_at_the_ends_is_a_no_op() {
    let (mut bucket, ids) = bucket_with_fields(&["A", "B"]);
    let before = bucket.clone();

    bucket.move_field(&ids[0], Direction::Up).expect("move");
    bucket.move_field(&ids[1], Direction::Down).expect("move");

    assert_eq!(bucket, before);
}

#[test]
fn test_move_section() {
    let mut bucket = Bucket::default();
    for s in ["One", "Two", "Three"] {
        bucket.add_section(s).expect("add section");
    }

    bucket.move_section("Three", Direction::Up).expect("move");
    bucket.move_section("One", Direction::Up).expect("move");

    assert_eq!(bucket.sections, vec!["One", "Three", "Two"]);
}

#[test]
fn test_update_field_keeps_placement() {
    let (mut bucket, ids) = bucket_with_fields(&["A", "B"]);
    bucket.toggle_active(&ids[1], false).expect("toggle");

    let mut draft = text_field("Renamed");
    draft.required = true;
    bucket.update_field(&ids[1], &draft).expect("update");

    let field = bucket.fields.iter().find(|f| f.id == ids[1]).expect("field");
    assert_eq!(field.label, "Renamed");
    assert!(field.required);
    assert_eq!(field.order, 1);
    assert!(!field.active);
}

#[test]
fn test_active_fields_skip_inactive() {
    let (mut bucket, ids) = bucket_with_fields(&["A", "B", "C"]);
    bucket.toggle_active(&ids[0], false).expect("toggle");

    let active = bucket.active_fields();
    assert_eq!(active.len(), 1);
    let labels: Vec<&str> = active[0].1.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["B", "C"]);
}

#[test]
fn test_registry_persists_per_bucket() {
    let (_dir, store) = setup_local_store();
    let registry = FieldRegistry::new(store);

    let (id, _) = registry
        .update(FormBucket::Installation, |b| {
            b.add_section("Cabling")?;
            b.add_field("Cabling", &text_field("Cable type"))
        })
        .expect("update");

    let installation = registry.load(FormBucket::Installation).expect("load");
    assert_eq!(installation.fields.len(), 1);
    assert_eq!(installation.fields[0].id, id);
    assert_eq!(registry.load(FormBucket::Assessment).expect("load"), Bucket::default());
}

#[test]
fn test_failed_update_writes_nothing() {
    let (_dir, store) = setup_local_store();
    let registry = FieldRegistry::new(store);
    registry
        .update(FormBucket::EskomSurvey, |b| b.add_section("Meters"))
        .expect("update");

    let result = registry.update(FormBucket::EskomSurvey, |b| {
        b.add_section("Extra")?;
        b.add_field("Missing", &text_field("X"))
    });

    assert!(result.is_err());
    assert_eq!(registry.load(FormBucket::EskomSurvey).expect("load").sections, vec!["Meters"]);
}

#[test]
fn test_bucket_names_and_field_json_shape() {
    assert_eq!(FormBucket::parse("eskomSurvey"), Some(FormBucket::EskomSurvey));
    assert_eq!(FormBucket::parse("survey"), None);

    let (bucket, _) = bucket_with_fields(&["A"]);
    let json = serde_json::to_value(&bucket.fields[0]).expect("serialize");
    assert_eq!(json["type"], "text");
    assert_eq!(json["section"], "Power");
    assert_eq!(json["order"], 0);
}

fn assert_dense_orders(bucket: &Bucket, section: &str) {
    let mut orders: Vec<u32> = bucket
        .fields
        .iter()
        .filter(|f| f.section == section)
        .map(|f| f.order)
        .collect();
    orders.sort_unstable();
    let expected: Vec<u32> = (0..orders.len() as u32).collect();
    assert_eq!(orders, expected);
}

#[test]
fn test_orders_stay_dense_through_mixed_operations() {
    let (mut bucket, mut ids) = bucket_with_fields(&["A", "B", "C", "D", "E"]);
    bucket.add_section("Other").expect("add section");
    let other = bucket.add_field("Other", &text_field("X")).expect("add field");

    bucket.move_field(&ids[4], Direction::Up).expect("move");
    assert_dense_orders(&bucket, "Power");
    bucket.delete_field(&ids[0]).expect("delete");
    ids.remove(0);
    assert_dense_orders(&bucket, "Power");
    ids.push(bucket.add_field("Power", &text_field("F")).expect("add"));
    assert_dense_orders(&bucket, "Power");
    bucket.move_field(&ids[0], Direction::Down).expect("move");
    bucket.delete_field(&ids[2]).expect("delete");
    bucket.move_field(&ids[3], Direction::Up).expect("move");
    assert_dense_orders(&bucket, "Power");

    bucket.delete_field(&other).expect("delete");
    assert_dense_orders(&bucket, "Other");
    assert_eq!(bucket.fields_in("Power").len(), 4);
}
