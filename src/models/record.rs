//! Backend survey and installation records: promoted columns plus an opaque
//! JSON remainder.

pub mod store;
pub mod types;

pub use self::store::{MemoryRecordStore, PgRecordStore, RecordStore};
pub use self::types::{
    FormRecord, NewFormRecord, PROMOTED, PromotedColumns, RecordFilter, RecordStatus,
    RecordSummary, form_from_record, merge, split,
};
