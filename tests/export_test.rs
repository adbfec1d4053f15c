//! Print export tests: document assembly, HTML and PDF output.

mod common;

use fieldops::export::document::{Block, DRAWINGS_GALLERY, PHOTO_GALLERY, build_document, humanize};
use fieldops::export::html::render_html;
use fieldops::export::{PdfSettings, export_filename, render_pdf};
use fieldops::forms::survey::{SurveyForm, TransportLink};
use common::*;

const ORG: &str = "Field Ops";

fn headings(blocks: &[Block]) -> Vec<&str> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading(h) => Some(h.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_blank_form_has_only_the_summary() {
    let doc = build_document(&SurveyForm::default(), ORG);

    assert_eq!(headings(&doc.blocks), vec!["Data Summary"]);
    assert!(!doc.has_gallery(PHOTO_GALLERY));
    assert!(!doc.has_gallery(DRAWINGS_GALLERY));
    assert!(!doc.has_approvals());
}

#[test]
fn test_summary_lists_scalars_and_hides_image_data() {
    let mut form = complete_survey();
    form.building_photo = png_data_uri(2, 2);
    let doc = build_document(&form, ORG);

    let Some(Block::Summary(items)) = doc.blocks.get(1) else {
        panic!("second block should be the summary");
    };
    let site = items.iter().find(|i| i.label == "Site Name").expect("site name row");
    assert_eq!(site.value, SITE_NAME);
    let photo = items.iter().find(|i| i.label == "Building Photo").expect("photo row");
    assert_eq!(photo.value, "Captured");
    assert!(items.iter().any(|i| i.label == "Equipment Room / Access Control" && i.value == "No"));
}

#[test]
fn test_repeated_groups_become_tables_under_their_section() {
    let mut form = complete_survey();
    form.transport_links = vec![
        TransportLink { link_number: 1, provider: "Openserve".into(), ..Default::default() },
        TransportLink { link_number: 2, provider: "Liquid".into(), ..Default::default() },
    ];
    let doc = build_document(&form, ORG);

    assert!(headings(&doc.blocks).contains(&"Transport Links"));
    let table = doc
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Table(t) if t.caption == "Transport Links" => Some(t),
            _ => None,
        })
        .expect("transport table");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1][1], "Liquid");
}

#[test]
fn test_galleries_appear_only_with_images() {
    let mut form = complete_survey();
    form.site_photos = vec![png_data_uri(4, 4), png_data_uri(4, 4)];
    let doc = build_document(&form, ORG);

    assert!(doc.has_gallery(PHOTO_GALLERY));
    assert!(!doc.has_gallery(DRAWINGS_GALLERY));
    let images = doc
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Gallery { images, .. } => Some(images),
            _ => None,
        })
        .expect("gallery");
    assert_eq!(images[1].caption, "Site Photos #2");
}

#[test]
fn test_approvals_render_when_any_is_filled() {
    let mut form = complete_survey();
    form.engineer_approval.name = "N. Dlamini".into();
    form.engineer_approval.accepted = true;
    let doc = build_document(&form, ORG);

    let Some(Block::Approvals { rows, signatures }) = doc.blocks.last() else {
        panic!("approvals should be the last block");
    };
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].role, "Engineer");
    assert!(rows[1].accepted);
    assert!(signatures.is_empty());
}

#[test]
fn test_html_contains_title_and_site() {
    let mut form = complete_survey();
    form.site_photos = vec![png_data_uri(3, 3)];
    let doc = build_document(&form, ORG);

    let html = render_html(&doc).expect("render html");

    assert!(html.contains("Site Survey"));
    assert!(html.contains(SITE_NAME));
    assert!(html.contains(";base64,"));
}

#[test]
fn test_pdf_is_a_pdf() {
    let mut form = complete_survey();
    form.site_photos = vec![png_data_uri(16, 16)];
    form.general_remarks = "Long remark ".repeat(200);
    let doc = build_document(&form, ORG);

    let bytes = render_pdf(&doc, &PdfSettings::default()).expect("render pdf");

    assert!(bytes.starts_with(b"%PDF-"));
    let loaded = lopdf::Document::load_mem(&bytes).expect("parse pdf");
    assert!(!loaded.get_pages().is_empty());
}

#[test]
fn test_pdf_signature_transparency_prints_white() {
    let mut form = complete_survey();
    form.engineer_approval.name = "N. Dlamini".into();
    form.engineer_approval.signature = transparent_signature_uri(20, 10);
    let doc = build_document(&form, ORG);

    let bytes = render_pdf(&doc, &PdfSettings::default()).expect("render pdf");
    let loaded = lopdf::Document::load_mem(&bytes).expect("parse pdf");

    let image = loaded
        .objects
        .values()
        .find_map(|obj| match obj {
            lopdf::Object::Stream(s)
                if s.dict.get(b"Subtype").and_then(|o| o.as_name()).ok() == Some(&b"Image"[..]) =>
            {
                Some(s)
            }
            _ => None,
        })
        .expect("embedded signature image");
    let pixels = image.decompressed_content().unwrap_or_else(|_| image.content.clone());

    assert_eq!(pixels.len(), 20 * 10 * 3);
    assert_eq!(&pixels[0..3], &[255, 255, 255]);
    let ink = (5 * 20) * 3;
    assert_eq!(&pixels[ink..ink + 3], &[0, 0, 0]);
}

#[test]
fn test_pdf_survives_broken_images() {
    let mut form = complete_survey();
    form.site_photos = vec!["data:image/png;base64,AAAA".to_string()];
    let doc = build_document(&form, ORG);

    assert!(render_pdf(&doc, &PdfSettings::default()).is_ok());
}

#[test]
fn test_filenames() {
    assert_eq!(export_filename("Midrand Substation", "survey", "pdf"), "Midrand_Substation_survey.pdf");
    assert_eq!(export_filename("  ", "installation", "html"), "untitled_installation.html");
    assert_eq!(export_filename("A / B", "survey", "pdf"), "A_B_survey.pdf");
}

#[test]
fn test_humanize() {
    assert_eq!(humanize("gpsCoordinates"), "Gps Coordinates");
    assert_eq!(humanize("region"), "Region");
}
