//! Field operations forms: site surveys and installation records, drafts,
//! submission to the backend, printable exports and admin allocation.

pub mod auth;
pub mod capture;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod forms;
pub mod handlers;
pub mod local_store;
pub mod models;
pub mod submission;
pub mod templates_structs;
