//! Drive a full scan: discovery, extraction, dedup, reconciliation.

use crate::dedup::dedup;
use crate::events::{EventSink, ScanEvent};
use crate::reconcile;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use transcat_catalog::{CatalogError, CatalogStore, KindOutcome, KindPlan, KindSnapshot};
use transcat_core::config::{ConfigError, TranscatConfig};
use transcat_core::source::{FoundSource, MissingPolicy, Occurrence, SourceKind};
use transcat_parser::{SourceExtractor, list_roots};

/// Fatal scan failures. Per-file extraction problems are logged and skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Totals for one completed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_scanned: usize,
    pub sources_found: usize,
    pub inserted: usize,
    pub renewed: usize,
    pub missing_acted: usize,
    pub policy: MissingPolicy,
}

/// Per-run working state. Empty between runs.
#[derive(Debug, Default)]
pub struct ScanState {
    snapshots: HashMap<SourceKind, KindSnapshot>,
    plans: HashMap<SourceKind, KindPlan>,
}

impl ScanState {
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.plans.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty() && self.plans.is_empty()
    }
}

/// Runs scans against one catalog store.
pub struct ScanOrchestrator<'s, S: CatalogStore> {
    store: &'s S,
    extractor: SourceExtractor,
    locale: String,
    events: EventSink,
    state: ScanState,
}

impl<'s, S: CatalogStore> ScanOrchestrator<'s, S> {
    pub fn new(store: &'s S, extractor: SourceExtractor, locale: impl Into<String>) -> Self {
        Self {
            store,
            extractor,
            locale: locale.into(),
            events: EventSink::none(),
            state: ScanState::default(),
        }
    }

    /// Orchestrator using the configured functions and source locale.
    pub fn from_config(store: &'s S, config: &TranscatConfig) -> Result<Self, ScanError> {
        let extractor = SourceExtractor::new(config.function_table()?);
        Ok(Self::new(store, extractor, config.source_locale.clone()))
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Scan `roots` and reconcile the catalog under `policy`.
    ///
    /// The working state is cleared before and after the run, whether or not it succeeds.
    pub fn run(
        &mut self,
        roots: &[PathBuf],
        policy: MissingPolicy,
    ) -> Result<ScanSummary, ScanError> {
        self.state.reset();
        let result = self.run_phases(roots, policy);
        self.state.reset();
        let summary = result?;
        self.events.emit(ScanEvent::Finished(summary));
        Ok(summary)
    }

    fn run_phases(
        &mut self,
        roots: &[PathBuf],
        policy: MissingPolicy,
    ) -> Result<ScanSummary, ScanError> {
        let files = list_roots(roots);
        tracing::info!("found {} files", files.len());
        self.events.emit(ScanEvent::FilesDiscovered { total: files.len() });

        let occurrences = self.extract_all(&files);
        let found = dedup(occurrences, self.extractor.functions());
        tracing::info!("found {} unique sources", found.len());
        self.events.emit(ScanEvent::SourcesFound { count: found.len() });

        for kind in SourceKind::ALL {
            let snapshot = self.store.snapshot(kind)?;
            self.state.snapshots.insert(kind, snapshot);
        }

        let now = Utc::now();
        let mut total = KindOutcome::default();
        for kind in SourceKind::ALL {
            let outcome = self.reconcile_kind(kind, &found, policy, now)?;
            tracing::info!(
                "{kind}: inserted {}, renewed {}, {} {}",
                outcome.inserted,
                outcome.renewed,
                policy.action_word(),
                outcome.missing_acted
            );
            self.events.emit(ScanEvent::KindReconciled { kind, outcome });
            total += outcome;
        }

        Ok(ScanSummary {
            files_scanned: files.len(),
            sources_found: found.len(),
            inserted: total.inserted,
            renewed: total.renewed,
            missing_acted: total.missing_acted,
            policy,
        })
    }

    /// Extract every file in parallel, preserving file order in the result.
    fn extract_all(&self, files: &[PathBuf]) -> Vec<Occurrence> {
        let extractor = &self.extractor;
        let events = &self.events;
        let per_file: Vec<Vec<Occurrence>> = files
            .par_iter()
            .map(|path| {
                let found = extractor.extract_or_skip(path);
                events.emit(ScanEvent::FileScanned { path: path.clone() });
                found
            })
            .collect();
        per_file.into_iter().flatten().collect()
    }

    fn reconcile_kind(
        &mut self,
        kind: SourceKind,
        found: &[FoundSource],
        policy: MissingPolicy,
        now: chrono::DateTime<Utc>,
    ) -> Result<KindOutcome, ScanError> {
        let values: Vec<&str> = found
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.value.as_str())
            .collect();
        let plan = match self.state.snapshots.get(&kind) {
            Some(snapshot) => reconcile::plan(snapshot, values.iter().copied()),
            None => reconcile::plan(&KindSnapshot::new(), values.iter().copied()),
        };
        for _ in &values {
            self.events.emit(ScanEvent::SourceProcessed { kind });
        }

        let outcome = reconcile::apply(self.store, kind, &plan, policy, &self.locale, now)?;
        self.state.plans.insert(kind, plan);
        Ok(outcome)
    }
}
