//! Shared test infrastructure.
//!
//! Nothing here needs Postgres: drafts and the field registry run on a
//! tempdir-backed `LocalStore`, and backend records go through
//! `MemoryRecordStore`.
#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;

use fieldops::forms::installation::InstallationForm;
use fieldops::forms::survey::SurveyForm;
use fieldops::local_store::LocalStore;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ENGINEER_ID: i64 = 7;
pub const OTHER_ENGINEER_ID: i64 = 8;
pub const SITE_NAME: &str = "Midrand Substation";
pub const REGION: &str = "Gauteng";
pub const SURVEY_DATE: &str = "2025-03-14";

// ============================================================================
// STORE SETUP
// ============================================================================

/// A local store rooted in a fresh temp directory. Keep the `TempDir` alive
/// for as long as the store is used.
pub fn setup_local_store() -> (TempDir, LocalStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LocalStore::open(dir.path().join("data")).expect("Failed to open local store");
    (dir, store)
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A survey with every required field filled in.
pub fn complete_survey() -> SurveyForm {
    SurveyForm {
        site_name: SITE_NAME.to_string(),
        region: REGION.to_string(),
        date: SURVEY_DATE.to_string(),
        site_id: "MID-014".to_string(),
        site_type: "Substation".to_string(),
        address: "12 Main Road, Midrand".to_string(),
        gps_coordinates: "-25.9992, 28.1263".to_string(),
        ..Default::default()
    }
}

pub fn complete_installation() -> InstallationForm {
    InstallationForm {
        site_name: SITE_NAME.to_string(),
        region: REGION.to_string(),
        date: SURVEY_DATE.to_string(),
        job_reference: "JOB-2231".to_string(),
        ..Default::default()
    }
}

/// A small solid-colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("Failed to encode PNG");
    out
}

pub fn png_data_uri(width: u32, height: u32) -> String {
    fieldops::capture::ImagePayload::from_bytes(&png_bytes(width, height))
        .expect("Failed to build payload")
        .as_str()
        .to_string()
}

/// A canvas-style signature: transparent background with one black stroke
/// along the middle row.
pub fn transparent_signature_uri(width: u32, height: u32) -> String {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for x in 0..width {
        img.put_pixel(x, height / 2, Rgba([0, 0, 0, 255]));
    }
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("Failed to encode PNG");
    fieldops::capture::ImagePayload::from_bytes(&out)
        .expect("Failed to build payload")
        .as_str()
        .to_string()
}
