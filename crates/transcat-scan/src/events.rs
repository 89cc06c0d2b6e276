//! Progress events emitted during a scan.

use crate::orchestrator::ScanSummary;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use transcat_catalog::KindOutcome;
use transcat_core::source::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    FilesDiscovered { total: usize },
    FileScanned { path: PathBuf },
    SourcesFound { count: usize },
    SourceProcessed { kind: SourceKind },
    KindReconciled { kind: SourceKind, outcome: KindOutcome },
    Finished(ScanSummary),
}

/// Optional event channel. Send failures (receiver gone) are ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<Sender<ScanEvent>>,
}

impl EventSink {
    pub fn new(sender: Sender<ScanEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ScanEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
