pub mod allocation;
pub mod dashboard;
pub mod drafts;
pub mod field_registry;
pub mod record;
pub mod user;
