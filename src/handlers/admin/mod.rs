pub mod allocations;
pub mod records;
pub mod registry;
