//! The worker loop: dequeue, fetch, record, acknowledge.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::context::RunContext;
use crate::errors::{CrawlError, CrawlResult};
use crate::frontier::{Dequeued, Task};
use crate::provider::filter_candidates;

/// Where a worker is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerState {
    /// Blocked on the frontier queue.
    Waiting,
    /// Looking up a task's suggestions.
    Fetching,
    /// Persisting and enqueuing new results under the recording lock.
    Recording,
    /// Exited the loop.
    Stopped,
}

/// Why a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// Dequeued a sentinel.
    Sentinel,
    /// Observed the cancellation flag.
    Cancelled,
    /// Timed out on a queue with nothing queued or in flight.
    Idle,
}

/// What a worker did before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Worker index within the pool.
    pub id: usize,
    /// Tasks dequeued and acknowledged, including skipped ones.
    pub tasks_handled: usize,
    /// Why the loop ended.
    pub cause: StopCause,
}

/// How a single task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Fetched { recorded: usize },
    TooDeep,
    AlreadyFetched,
}

pub(crate) struct Worker {
    id: usize,
    context: Arc<RunContext>,
    state: WorkerState,
    tasks_handled: usize,
}

impl Worker {
    pub(crate) fn new(id: usize, context: Arc<RunContext>) -> Self {
        Self {
            id,
            context,
            state: WorkerState::Waiting,
            tasks_handled: 0,
        }
    }

    /// Runs until a sentinel, cancellation, or idle completion.
    pub(crate) fn run(mut self) -> WorkerReport {
        let span = tracing::debug_span!("worker", id = self.id);
        let _enter = span.enter();
        debug!("Worker started");

        let cause = loop {
            if self.context.token.is_cancelled() {
                break StopCause::Cancelled;
            }

            self.transition(WorkerState::Waiting);
            match self.context.queue.pop(self.context.config.queue_timeout()) {
                Dequeued::Sentinel => {
                    self.context.queue.ack();
                    break StopCause::Sentinel;
                }
                Dequeued::Task(task) => {
                    if self.context.token.is_cancelled() {
                        self.context.queue.ack();
                        break StopCause::Cancelled;
                    }
                    self.handle(&task);
                }
                Dequeued::TimedOut => {
                    if self.context.token.is_cancelled() {
                        break StopCause::Cancelled;
                    }
                    if self.context.queue.is_drained() {
                        break StopCause::Idle;
                    }
                    trace!("Queue idle, waiting again");
                }
            }
        };

        self.transition(WorkerState::Stopped);
        debug!(?cause, tasks = self.tasks_handled, "Worker stopped");
        WorkerReport {
            id: self.id,
            tasks_handled: self.tasks_handled,
            cause,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "Worker state change");
            self.state = next;
        }
    }

    /// Processes one task and acknowledges it exactly once, whatever happens.
    fn handle(&mut self, task: &Task) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.process(task)));
        let failure = match outcome {
            Ok(Ok(outcome)) => {
                trace!(query = task.query(), ?outcome, "Task done");
                None
            }
            Ok(Err(error)) => Some(error),
            Err(payload) => Some(CrawlError::TaskPanicked {
                query: task.query().to_string(),
                message: panic_message(payload.as_ref()),
            }),
        };

        if let Some(error) = failure {
            self.context.counters.record_task_error();
            warn!(
                query = task.query(),
                depth = task.depth(),
                error_kind = %error.kind(),
                "Task failed: {error}"
            );
        }

        self.tasks_handled += 1;
        self.context.queue.ack();
    }

    fn process(&mut self, task: &Task) -> CrawlResult<TaskOutcome> {
        let ctx = Arc::clone(&self.context);
        self.transition(WorkerState::Fetching);

        if !task.within_depth(ctx.config.max_depth) {
            ctx.counters.record_depth_skip();
            return Ok(TaskOutcome::TooDeep);
        }
        if !ctx.registry.try_claim_query(task.query()) {
            ctx.counters.record_duplicate_skip();
            return Ok(TaskOutcome::AlreadyFetched);
        }

        ctx.observer.on_task_start(task);
        let candidates = match ctx.provider.lookup(task.query()) {
            Ok(candidates) => candidates,
            Err(error) => {
                ctx.counters.record_lookup_failure();
                warn!(
                    query = task.query(),
                    error_kind = %error.kind(),
                    "Lookup failed, continuing with no suggestions: {error}"
                );
                ctx.observer.on_lookup_error(task, &error);
                Vec::new()
            }
        };
        ctx.counters.record_fetch();
        let candidates = filter_candidates(candidates, &ctx.keyword);

        self.transition(WorkerState::Recording);
        let recorded = self.record(task, candidates)?;

        let delay = ctx.config.worker_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        Ok(TaskOutcome::Fetched { recorded })
    }

    /// Persists, claims and enqueues new candidates as one critical section.
    ///
    /// A result is claimed only after the sink accepted it, so the registry
    /// never counts a result that was not written. Claims happen only under
    /// the recording lock, so the check-then-claim cannot race.
    fn record(&self, task: &Task, candidates: Vec<String>) -> CrawlResult<usize> {
        let ctx = &self.context;
        let mut sink = ctx.sink.lock();
        let mut recorded = 0;

        for candidate in candidates {
            if ctx.registry.has_result(&candidate) {
                continue;
            }
            sink.append(&candidate)?;
            ctx.registry.try_claim_result(&candidate);
            ctx.observer.on_result(&candidate, task.depth() + 1);
            ctx.queue.push(task.child(candidate));
            recorded += 1;
        }

        Ok(recorded)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
