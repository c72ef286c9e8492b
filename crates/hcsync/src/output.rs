//! Run summaries and progress display.
//!
//! The summary is a `tabled` table on stdout, one row per stream. The
//! spinner is an `indicatif` progress bar on stderr driven through the
//! engine's `SyncObserver` hooks.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use hcsync_core::{Outcome, StreamKey, StreamReport, SyncObserver};

use crate::cli::ColorMode;

// ── Color ────────────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Summary table ────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Stream")]
    stream: String,
    #[tabled(rename = "Found")]
    found: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Inserted")]
    inserted: usize,
    #[tabled(rename = "Calls")]
    calls: u32,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Cursor")]
    cursor: String,
}

fn outcome_label(outcome: &Outcome, color: bool) -> String {
    match (outcome, color) {
        (Outcome::Done(reason), true) => reason.green().to_string(),
        (Outcome::Done(reason), false) => reason.to_string(),
        (Outcome::Failed(_), true) => "failed".red().bold().to_string(),
        (Outcome::Failed(_), false) => "failed".to_owned(),
    }
}

fn row(report: &StreamReport, color: bool) -> SummaryRow {
    SummaryRow {
        stream: report.stream.to_string(),
        found: report.found,
        skipped: report.skipped,
        inserted: report.inserted,
        calls: report.calls,
        outcome: outcome_label(&report.outcome, color),
        cursor: report
            .final_cursor
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string),
    }
}

pub fn render_summary(reports: &[StreamReport], color: bool) -> String {
    let rows: Vec<SummaryRow> = reports.iter().map(|r| row(r, color)).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print to stdout unless quiet.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Progress ─────────────────────────────────────────────────────────

/// Spinner showing the stream being synced and its running counters.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet || !io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {prefix:.bold} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SyncObserver for Progress {
    fn on_stream_start(&self, stream: &StreamKey) {
        self.bar.set_prefix(stream.to_string());
        self.bar.set_message("fetching");
    }

    fn on_batch(&self, report: &StreamReport) {
        self.bar.set_message(format!(
            "{} found, {} inserted, {} calls",
            report.found, report.inserted, report.calls
        ));
    }

    fn on_stream_end(&self, report: &StreamReport) {
        if let Outcome::Failed(err) = &report.outcome {
            self.bar.println(format!("{}: {err}", report.stream));
        }
    }
}

#[cfg(test)]
mod tests {
    use hcsync_core::{CoreError, Cursor, StopReason};

    use super::*;

    fn report(outcome: Outcome, cursor: Option<Cursor>) -> StreamReport {
        StreamReport {
            found: 5,
            skipped: 1,
            inserted: 4,
            calls: 2,
            outcome,
            final_cursor: cursor,
            ..StreamReport::new(StreamKey::events())
        }
    }

    #[test]
    fn summary_lists_counters_and_cursor() {
        let table = render_summary(
            &[report(Outcome::Done(StopReason::CaughtUp), Some(Cursor::EventId(42)))],
            false,
        );
        assert!(table.contains("Inserted"));
        assert!(table.contains("caught-up"));
        assert!(table.contains("42"));
    }

    #[test]
    fn failed_stream_without_cursor() {
        let table = render_summary(
            &[report(
                Outcome::Failed(CoreError::SinkWrite {
                    reason: "HTTP 500".into(),
                }),
                None,
            )],
            false,
        );
        assert!(table.contains("failed"));
        assert!(table.contains(" - "));
    }
}
