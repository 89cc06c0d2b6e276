//! Source scanning: extract, deduplicate and reconcile against the catalog.

pub mod dedup;
pub mod events;
pub mod orchestrator;
pub mod reconcile;

pub use dedup::dedup;
pub use events::{EventSink, ScanEvent};
pub use orchestrator::{ScanError, ScanOrchestrator, ScanState, ScanSummary};
pub use reconcile::{apply, plan};
