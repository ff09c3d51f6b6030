//! State shared by the coordinator and every worker of one run.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::config::CrawlConfig;
use crate::frontier::{DedupRegistry, FrontierQueue};
use crate::observability::{CrawlObserver, CrawlStats};
use crate::provider::SuggestionProvider;
use crate::sink::ResultSink;

/// Everything a worker needs, handed out as an `Arc` at spawn time.
pub(crate) struct RunContext {
    pub(crate) config: CrawlConfig,
    /// Lowercased seed keyword used for queries and filtering.
    pub(crate) keyword: String,
    pub(crate) queue: Arc<FrontierQueue>,
    pub(crate) registry: DedupRegistry,
    /// The recording lock. Result claims, sink writes and child pushes for
    /// one task all happen while it is held.
    pub(crate) sink: Mutex<Box<dyn ResultSink>>,
    pub(crate) provider: Arc<dyn SuggestionProvider>,
    pub(crate) observer: Arc<dyn CrawlObserver>,
    pub(crate) token: Arc<CancellationToken>,
    pub(crate) counters: CrawlCounters,
}

impl RunContext {
    pub(crate) fn new(
        config: CrawlConfig,
        sink: Box<dyn ResultSink>,
        provider: Arc<dyn SuggestionProvider>,
        observer: Arc<dyn CrawlObserver>,
        token: Arc<CancellationToken>,
    ) -> Self {
        let queue = Arc::new(FrontierQueue::new());

        // Lets a coordinator parked on the drain barrier notice an interrupt.
        let waker = queue.clone();
        token.on_cancel(move || waker.wake_waiters());

        Self {
            keyword: config.normalized_keyword(),
            config,
            queue,
            registry: DedupRegistry::new(),
            sink: Mutex::new(sink),
            provider,
            observer,
            token,
            counters: CrawlCounters::default(),
        }
    }

    pub(crate) fn stats(&self) -> CrawlStats {
        self.counters.snapshot(self.registry.result_count())
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("keyword", &self.keyword)
            .field("queue", &self.queue)
            .field("registry", &self.registry)
            .field("provider", &self.provider.name())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Lock-free run counters.
#[derive(Debug, Default)]
pub(crate) struct CrawlCounters {
    queries_fetched: AtomicUsize,
    skipped_depth: AtomicUsize,
    skipped_duplicate: AtomicUsize,
    lookup_failures: AtomicUsize,
    task_errors: AtomicUsize,
    discarded_on_interrupt: AtomicUsize,
}

impl CrawlCounters {
    pub(crate) fn record_fetch(&self) {
        self.queries_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_depth_skip(&self) {
        self.skipped_depth.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate_skip(&self) {
        self.skipped_duplicate.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_task_error(&self) {
        self.task_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.discarded_on_interrupt.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, results: usize) -> CrawlStats {
        CrawlStats {
            results,
            queries_fetched: self.queries_fetched.load(Ordering::Relaxed),
            skipped_depth: self.skipped_depth.load(Ordering::Relaxed),
            skipped_duplicate: self.skipped_duplicate.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            task_errors: self.task_errors.load(Ordering::Relaxed),
            discarded_on_interrupt: self.discarded_on_interrupt.load(Ordering::Relaxed),
        }
    }
}
