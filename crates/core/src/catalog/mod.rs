//! Program catalog - the persisted collection of repository records.
//!
//! The JSON snapshot is the portable source of truth; the SQLite mirror is a
//! disposable projection rebuilt from it. Collection runs merge new records
//! into the snapshot by case-insensitive "owner/name" identity.

mod json_store;
mod merge;
mod sqlite;
mod types;

pub use json_store::JsonCatalogStore;
pub use merge::{merge_records, MergeOutcome};
pub use sqlite::{SqliteMirror, SCHEMA_VERSION};
pub use types::*;
