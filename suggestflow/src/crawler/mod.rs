//! The crawl engine.
//!
//! This module provides:
//! - `Crawler`, which owns one run's frontier, registry and sink
//! - `CrawlerBuilder` for wiring providers, sinks and observers
//! - The worker pool and its shutdown coordinator

mod context;
mod coordinator;
mod worker;


pub use worker::{StopCause, WorkerReport};

use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::config::CrawlConfig;
use crate::errors::{ConfigError, CrawlError, CrawlResult};
use crate::frontier::{DedupRegistry, Task};
use crate::observability::{CrawlObserver, CrawlSummary, NoOpCrawlObserver, ShutdownReason};
use crate::provider::SuggestionProvider;
use crate::sink::{output_path, FileResultSink, ResultSink};
use context::RunContext;
use coordinator::ShutdownCoordinator;
use worker::Worker;

/// Builder for [`Crawler`].
pub struct CrawlerBuilder {
    config: CrawlConfig,
    provider: Option<Arc<dyn SuggestionProvider>>,
    sink: Option<Box<dyn ResultSink>>,
    observer: Arc<dyn CrawlObserver>,
    token: Arc<CancellationToken>,
}

impl CrawlerBuilder {
    /// Starts a builder for the given configuration.
    #[must_use]
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            config,
            provider: None,
            sink: None,
            observer: Arc::new(NoOpCrawlObserver),
            token: Arc::new(CancellationToken::new()),
        }
    }

    /// Sets the suggestion provider. Required.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the result sink.
    ///
    /// Without one, a [`FileResultSink`] is created under the configured
    /// output directory when the crawler is built.
    #[must_use]
    pub fn sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the progress observer.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Shares an existing cancellation token, e.g. one wired to a signal handler.
    #[must_use]
    pub fn cancellation_token(mut self, token: Arc<CancellationToken>) -> Self {
        self.token = token;
        self
    }

    /// Validates the configuration and initializes the sink.
    ///
    /// Fails before any worker exists if the configuration is invalid, no
    /// provider was given, or the output file cannot be created.
    pub fn build(self) -> CrawlResult<Crawler> {
        self.config.validate()?;
        let provider = self
            .provider
            .ok_or_else(|| ConfigError::new("provider", "a suggestion provider is required"))?;

        let sink = match self.sink {
            Some(sink) => sink,
            None => {
                let path = output_path(&self.config.output_dir, &self.config.main_keyword, &Local::now());
                Box::new(FileResultSink::initialize(path)?)
            }
        };

        let output_path = sink.location().map(Path::to_path_buf);
        Ok(Crawler {
            run_id: Uuid::new_v4(),
            output_path,
            context: Arc::new(RunContext::new(
                self.config,
                sink,
                provider,
                self.observer,
                self.token,
            )),
            started: AtomicBool::new(false),
        })
    }
}

/// A single crawl run over a fresh frontier and registry.
pub struct Crawler {
    run_id: Uuid,
    output_path: Option<PathBuf>,
    context: Arc<RunContext>,
    started: AtomicBool,
}

impl Crawler {
    /// Starts a builder.
    #[must_use]
    pub fn builder(config: CrawlConfig) -> CrawlerBuilder {
        CrawlerBuilder::new(config)
    }

    /// Unique id of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The run's configuration.
    #[must_use]
    pub fn config(&self) -> &CrawlConfig {
        &self.context.config
    }

    /// Where results are written, if the sink is a file.
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Token that interrupts the run when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.context.token)
    }

    /// The run's dedup registry.
    #[must_use]
    pub fn registry(&self) -> &DedupRegistry {
        &self.context.registry
    }

    /// Runs the crawl to completion or interruption.
    ///
    /// Blocks the calling thread, which acts as the shutdown coordinator.
    /// Errors only if the crawler already ran or worker threads could not be
    /// spawned; per-task failures are logged and counted in the summary.
    pub fn run(&self) -> CrawlResult<CrawlSummary> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CrawlError::Internal("crawler has already run".to_string()));
        }

        let ctx = &self.context;
        let span = tracing::info_span!("crawl", run_id = %self.run_id, keyword = %ctx.keyword);
        let _enter = span.enter();

        let started_at = Utc::now();
        let timer = Instant::now();
        info!(
            workers = ctx.config.num_workers,
            max_depth = ctx.config.max_depth,
            provider = ctx.provider.name(),
            "Starting crawl"
        );

        ctx.queue.push(Task::seed(ctx.keyword.clone()));
        let handles = self.spawn_workers()?;

        let coordinator = ShutdownCoordinator::new(ctx);
        let reason = coordinator.await_shutdown(&handles);
        let timeout = match reason {
            ShutdownReason::Completed => ctx.config.join_timeout(),
            ShutdownReason::Interrupted => ctx.config.interrupt_join_timeout(),
        };
        let joined = ShutdownCoordinator::join(handles, timeout);
        if joined.panicked > 0 {
            error!(count = joined.panicked, "Worker threads panicked");
        }

        let summary = CrawlSummary::new(ctx.config.main_keyword.clone(), reason, ctx.stats())
            .with_run_id(self.run_id)
            .with_output_path(self.output_path.clone())
            .with_timing(started_at, timer.elapsed().as_secs_f64() * 1000.0)
            .with_leaked_workers(joined.leaked)
            .with_workers(joined.reports);

        info!(
            results = summary.stats.results,
            queries = summary.stats.queries_fetched,
            %reason,
            leaked = joined.leaked,
            "Crawl finished"
        );
        ctx.observer.on_finish(&summary);
        Ok(summary)
    }

    fn spawn_workers(&self) -> CrawlResult<Vec<JoinHandle<WorkerReport>>> {
        let ctx = &self.context;
        let mut handles = Vec::with_capacity(ctx.config.num_workers);

        for id in 0..ctx.config.num_workers {
            let worker = Worker::new(id, Arc::clone(ctx));
            let spawned = std::thread::Builder::new()
                .name(format!("suggestflow-worker-{id}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(id, "Failed to spawn worker: {e}");
                    ctx.token.cancel("worker spawn failed");
                    ShutdownCoordinator::new(ctx).interrupt();
                    ShutdownCoordinator::join(handles, ctx.config.interrupt_join_timeout());
                    return Err(CrawlError::Io(e));
                }
            }
        }

        Ok(handles)
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("run_id", &self.run_id)
            .field("output_path", &self.output_path)
            .field("context", &self.context)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}
