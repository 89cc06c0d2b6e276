//! Terminal progress display for scans.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;
use transcat_core::source::MissingPolicy;
use transcat_scan::{ScanEvent, ScanSummary};

/// Progress bars driven by [`ScanEvent`]s.
pub struct ScanProgress {
    multi: MultiProgress,
    phase_bar: ProgressBar,
    status: ProgressBar,
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let phase_bar = multi.add(ProgressBar::new(0));
        phase_bar.set_style(
            ProgressStyle::default_bar()
                .template("  {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("##-"),
        );

        let status = multi.add(ProgressBar::new_spinner());
        status.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .expect("valid template"),
        );

        Self {
            multi,
            phase_bar,
            status,
        }
    }

    /// Drain `events` on a background thread until every sender is dropped.
    pub fn spawn(events: Receiver<ScanEvent>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let progress = ScanProgress::new();
            for event in events {
                progress.handle(&event);
            }
            progress.finish();
        })
    }

    fn start_phase(&self, name: &str, total: usize) {
        self.phase_bar.set_prefix(name.to_string());
        self.phase_bar.set_length(total as u64);
        self.phase_bar.set_position(0);
        self.phase_bar.set_message("");
    }

    pub fn handle(&self, event: &ScanEvent) {
        match event {
            ScanEvent::FilesDiscovered { total } => {
                self.multi
                    .suspend(|| eprintln!("Found {total} files. Processing..."));
                self.start_phase("Scanning", *total);
            }
            ScanEvent::FileScanned { path } => {
                self.phase_bar.inc(1);
                if let Some(name) = path.file_name() {
                    self.phase_bar.set_message(name.to_string_lossy().into_owned());
                }
            }
            ScanEvent::SourcesFound { count } => {
                self.start_phase("Reconciling", *count);
                self.status.set_message(format!("{count} unique sources"));
                self.status.tick();
            }
            ScanEvent::SourceProcessed { kind } => {
                self.phase_bar.inc(1);
                self.phase_bar.set_message(kind.to_string());
            }
            ScanEvent::KindReconciled { kind, outcome } => {
                self.status.set_message(format!(
                    "{kind}: {} inserted, {} renewed",
                    outcome.inserted, outcome.renewed
                ));
                self.status.tick();
            }
            ScanEvent::Finished(_) => self.finish(),
        }
    }

    pub fn finish(&self) {
        self.phase_bar.finish_and_clear();
        self.status.finish_and_clear();
    }
}

/// Operator-facing result lines for a finished scan.
pub fn summary_lines(summary: &ScanSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.sources_found == 0 {
        lines.push("No source string found.".to_string());
    } else if summary.inserted > 0 {
        lines.push(format!("Inserted {} new sources.", summary.inserted));
    } else {
        lines.push("No new sources found.".to_string());
    }
    if summary.renewed > 0 {
        lines.push(format!("Renewed {} sources.", summary.renewed));
    }
    match (summary.policy, summary.missing_acted) {
        (MissingPolicy::DoNothing, _) => {}
        (policy, 0) => lines.push(format!("No sources were {}.", policy.action_word())),
        (MissingPolicy::Delete, n) => lines.push(format!("Deleted {n} sources.")),
        (MissingPolicy::Mark, n) => lines.push(format!("Marked as missing {n} sources.")),
    }
    lines
}
