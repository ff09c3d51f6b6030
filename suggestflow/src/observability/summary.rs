//! End-of-run reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::crawler::WorkerReport;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
    /// Every task was processed.
    Completed,
    /// An external interrupt stopped the run early.
    Interrupted,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Counters gathered over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Distinct results persisted.
    pub results: usize,
    /// Queries sent to the provider.
    pub queries_fetched: usize,
    /// Tasks discarded for reaching the depth limit.
    pub skipped_depth: usize,
    /// Tasks discarded because their query was already fetched.
    pub skipped_duplicate: usize,
    /// Lookups that failed and were treated as empty.
    pub lookup_failures: usize,
    /// Tasks that failed for any other reason.
    pub task_errors: usize,
    /// Queued tasks discarded by an interruption.
    pub discarded_on_interrupt: usize,
}

/// Final report of a crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// Seed keyword as configured.
    pub keyword: String,
    /// Why the run stopped.
    pub reason: ShutdownReason,
    /// Run counters.
    pub stats: CrawlStats,
    /// Where results were written, if to a file.
    pub output_path: Option<PathBuf>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: f64,
    /// Workers that did not exit within the join timeout.
    pub leaked_workers: usize,
    /// Per-worker reports, for workers that were joined.
    #[serde(default)]
    pub workers: Vec<WorkerReport>,
}

impl CrawlSummary {
    /// Creates a summary with no output path, zero duration and no leaks.
    #[must_use]
    pub fn new(keyword: impl Into<String>, reason: ShutdownReason, stats: CrawlStats) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            keyword: keyword.into(),
            reason,
            stats,
            output_path: None,
            started_at: Utc::now(),
            elapsed_ms: 0.0,
            leaked_workers: 0,
            workers: Vec::new(),
        }
    }

    /// Sets the run id.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Sets the output path.
    #[must_use]
    pub fn with_output_path(mut self, path: Option<PathBuf>) -> Self {
        self.output_path = path;
        self
    }

    /// Sets the start time and duration.
    #[must_use]
    pub fn with_timing(mut self, started_at: DateTime<Utc>, elapsed_ms: f64) -> Self {
        self.started_at = started_at;
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Sets the leaked worker count.
    #[must_use]
    pub fn with_leaked_workers(mut self, leaked: usize) -> Self {
        self.leaked_workers = leaked;
        self
    }

    /// Sets the per-worker reports, ordered by worker id.
    #[must_use]
    pub fn with_workers(mut self, mut workers: Vec<WorkerReport>) -> Self {
        workers.sort_by_key(|report| report.id);
        self.workers = workers;
        self
    }

    /// Whether the run was cut short.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.reason == ShutdownReason::Interrupted
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done ({})! Collected {} suggestions",
            self.reason, self.stats.results
        )?;
        if let Some(path) = &self.output_path {
            write!(f, "\nResults saved to: {}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::StopCause;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_display() {
        let summary = CrawlSummary::new(
            "rust",
            ShutdownReason::Completed,
            CrawlStats {
                results: 42,
                ..CrawlStats::default()
            },
        )
        .with_output_path(Some(PathBuf::from("results/suggestions_rust.txt")));

        assert_eq!(
            summary.to_string(),
            "Done (completed)! Collected 42 suggestions\nResults saved to: results/suggestions_rust.txt"
        );
        assert!(!summary.was_interrupted());
    }

    #[test]
    fn test_summary_display_without_path() {
        let summary = CrawlSummary::new("rust", ShutdownReason::Interrupted, CrawlStats::default());
        assert_eq!(summary.to_string(), "Done (interrupted)! Collected 0 suggestions");
        assert!(summary.was_interrupted());
    }

    #[test]
    fn test_summary_to_json() {
        let summary = CrawlSummary::new(
            "rust",
            ShutdownReason::Interrupted,
            CrawlStats {
                results: 3,
                lookup_failures: 1,
                ..CrawlStats::default()
            },
        )
        .with_leaked_workers(1);

        let json = summary.to_json();
        assert_eq!(json["keyword"], "rust");
        assert_eq!(json["reason"], "interrupted");
        assert_eq!(json["stats"]["results"], 3);
        assert_eq!(json["stats"]["lookup_failures"], 1);
        assert_eq!(json["leaked_workers"], 1);
        assert!(json["output_path"].is_null());
        assert_eq!(json["workers"], serde_json::json!([]));
    }

    #[test]
    fn test_summary_orders_worker_reports() {
        let report = |id, cause| WorkerReport {
            id,
            tasks_handled: id * 2,
            cause,
        };
        let summary = CrawlSummary::new("rust", ShutdownReason::Completed, CrawlStats::default())
            .with_workers(vec![report(1, StopCause::Idle), report(0, StopCause::Sentinel)]);

        assert_eq!(summary.workers[0].id, 0);
        assert_eq!(summary.workers[1].cause, StopCause::Idle);
        let json = summary.to_json();
        assert_eq!(json["workers"][0]["cause"], "sentinel");
        assert_eq!(json["workers"][1]["tasks_handled"], 2);
    }
}
