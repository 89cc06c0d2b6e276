//! SQLite-backed translation catalog.
//!
//! Holds the two source tables (grouped and text) and the messages table,
//! exposes the [`CatalogStore`] seam used by scans, and the
//! [`TranslationLoader`] that serves translations back to an application.

pub mod loader;
pub mod schema;
pub mod store;

pub use loader::TranslationLoader;
pub use store::{
    CatalogError, CatalogStore, KindOutcome, KindPlan, KindSnapshot, SnapshotEntry, SqliteCatalog,
};
