//! Progress callbacks for crawl runs.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::CrawlSummary;
use crate::errors::CrawlError;
use crate::frontier::Task;

/// Receives progress notifications from workers and the coordinator.
///
/// Callbacks run on worker threads. `on_result` is called inside the
/// recording critical section, so it must be quick and must not block on
/// other crawl state.
pub trait CrawlObserver: Send + Sync {
    /// Called when a worker starts fetching a task.
    fn on_task_start(&self, task: &Task);

    /// Called once for every persisted result.
    fn on_result(&self, result: &str, depth: usize);

    /// Called when a lookup fails and is treated as empty.
    fn on_lookup_error(&self, task: &Task, error: &CrawlError);

    /// Called once the run has fully stopped.
    fn on_finish(&self, summary: &CrawlSummary);
}

/// No-op implementation of [`CrawlObserver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCrawlObserver;

impl CrawlObserver for NoOpCrawlObserver {
    fn on_task_start(&self, _task: &Task) {}
    fn on_result(&self, _result: &str, _depth: usize) {}
    fn on_lookup_error(&self, _task: &Task, _error: &CrawlError) {}
    fn on_finish(&self, _summary: &CrawlSummary) {}
}

/// Logging-based observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCrawlObserver;

impl CrawlObserver for LoggingCrawlObserver {
    fn on_task_start(&self, task: &Task) {
        info!(query = task.query(), depth = task.depth(), "Processing query");
    }

    fn on_result(&self, result: &str, depth: usize) {
        debug!(result, depth, "Recorded result");
    }

    fn on_lookup_error(&self, task: &Task, error: &CrawlError) {
        warn!(
            query = task.query(),
            depth = task.depth(),
            error_kind = %error.kind(),
            "Lookup failed: {error}"
        );
    }

    fn on_finish(&self, summary: &CrawlSummary) {
        info!(
            results = summary.stats.results,
            queries = summary.stats.queries_fetched,
            reason = %summary.reason,
            "Crawl finished"
        );
    }
}

/// An event captured by [`CollectingCrawlObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A task began fetching.
    TaskStarted(Task),
    /// A result was persisted at the given child depth.
    Result(String, usize),
    /// A lookup failed.
    LookupError(Task),
    /// The run finished with this many results.
    Finished(usize),
}

/// Collects every notification, for tests.
#[derive(Debug, Default)]
pub struct CollectingCrawlObserver {
    events: Mutex<Vec<CrawlEvent>>,
}

impl CollectingCrawlObserver {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().clone()
    }

    /// Tasks that started fetching, in arrival order.
    #[must_use]
    pub fn started_tasks(&self) -> Vec<Task> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                CrawlEvent::TaskStarted(task) => Some(task.clone()),
                _ => None,
            })
            .collect()
    }

    /// Results in the order they were persisted.
    #[must_use]
    pub fn results(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                CrawlEvent::Result(result, _) => Some(result.clone()),
                _ => None,
            })
            .collect()
    }
}

impl CrawlObserver for CollectingCrawlObserver {
    fn on_task_start(&self, task: &Task) {
        self.events.lock().push(CrawlEvent::TaskStarted(task.clone()));
    }

    fn on_result(&self, result: &str, depth: usize) {
        self.events
            .lock()
            .push(CrawlEvent::Result(result.to_string(), depth));
    }

    fn on_lookup_error(&self, task: &Task, _error: &CrawlError) {
        self.events.lock().push(CrawlEvent::LookupError(task.clone()));
    }

    fn on_finish(&self, summary: &CrawlSummary) {
        self.events
            .lock()
            .push(CrawlEvent::Finished(summary.stats.results));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::{CrawlStats, ShutdownReason};

    #[test]
    fn test_collecting_observer() {
        let observer = CollectingCrawlObserver::new();
        let task = Task::seed("rust");

        observer.on_task_start(&task);
        observer.on_result("rust lang", 1);
        observer.on_lookup_error(&task, &CrawlError::transport("rust", "timeout"));
        observer.on_finish(&CrawlSummary::new(
            "rust",
            ShutdownReason::Completed,
            CrawlStats {
                results: 1,
                ..CrawlStats::default()
            },
        ));

        assert_eq!(observer.started_tasks(), vec![task.clone()]);
        assert_eq!(observer.results(), vec!["rust lang".to_string()]);
        assert_eq!(
            observer.events(),
            vec![
                CrawlEvent::TaskStarted(task.clone()),
                CrawlEvent::Result("rust lang".to_string(), 1),
                CrawlEvent::LookupError(task),
                CrawlEvent::Finished(1),
            ]
        );
    }

    #[test]
    fn test_noop_and_logging_observers() {
        let task = Task::seed("rust");
        let error = CrawlError::malformed("rust", "not xml");
        let summary = CrawlSummary::new("rust", ShutdownReason::Interrupted, CrawlStats::default());

        for observer in [&NoOpCrawlObserver as &dyn CrawlObserver, &LoggingCrawlObserver] {
            observer.on_task_start(&task);
            observer.on_result("rust lang", 1);
            observer.on_lookup_error(&task, &error);
            observer.on_finish(&summary);
        }
    }
}
