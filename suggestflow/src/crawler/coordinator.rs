//! Shutdown coordination for a worker pool.
//!
//! Natural completion waits on the queue's drain barrier and then sends one
//! sentinel per worker. An interruption discards the queued frontier, acking
//! it so the barrier cannot hang, and sends the same sentinels. Either way
//! workers are joined with a bounded timeout.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::context::RunContext;
use super::worker::WorkerReport;
use crate::frontier::{deadline_after, DrainStatus};
use crate::observability::ShutdownReason;

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
const WORKER_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Result of joining the pool.
#[derive(Debug, Default)]
pub(crate) struct JoinOutcome {
    pub(crate) reports: Vec<WorkerReport>,
    /// Workers still running at the deadline.
    pub(crate) leaked: usize,
    /// Workers whose thread panicked outside task handling.
    pub(crate) panicked: usize,
}

pub(crate) struct ShutdownCoordinator<'a> {
    context: &'a RunContext,
}

impl<'a> ShutdownCoordinator<'a> {
    pub(crate) const fn new(context: &'a RunContext) -> Self {
        Self { context }
    }

    /// Blocks until the run completes or is interrupted, then signals every worker to stop.
    ///
    /// If every handle in `workers` has exited while work is still
    /// outstanding, nothing can drain the queue any more and the run is
    /// treated as interrupted.
    pub(crate) fn await_shutdown(&self, workers: &[JoinHandle<WorkerReport>]) -> ShutdownReason {
        let ctx = self.context;
        loop {
            match ctx.queue.wait_for_drain(&ctx.token, WORKER_CHECK_INTERVAL) {
                DrainStatus::Drained => break,
                DrainStatus::Cancelled => {
                    self.interrupt();
                    return ShutdownReason::Interrupted;
                }
                DrainStatus::Pending => {
                    // Only workers push, so once all have exited the count cannot drop.
                    if workers.iter().all(JoinHandle::is_finished) && ctx.queue.unfinished() > 0 {
                        error!(
                            unfinished = ctx.queue.unfinished(),
                            "Every worker exited with work outstanding"
                        );
                        ctx.token.cancel("every worker exited");
                        self.interrupt();
                        return ShutdownReason::Interrupted;
                    }
                }
            }
        }

        let settle = ctx.config.settle_delay();
        if !settle.is_zero() {
            std::thread::sleep(settle);
            if ctx.token.is_cancelled() {
                self.interrupt();
                return ShutdownReason::Interrupted;
            }
        }
        info!("Frontier drained, stopping workers");
        self.send_sentinels();
        ShutdownReason::Completed
    }

    /// Discards pending work and sends one sentinel per worker.
    pub(crate) fn interrupt(&self) -> usize {
        let discarded = self.context.queue.drain_pending();
        self.context.counters.record_discarded(discarded);
        info!(
            discarded,
            reason = self.context.token.reason().as_deref().unwrap_or("unspecified"),
            "Interrupted, stopping workers"
        );
        self.send_sentinels();
        discarded
    }

    fn send_sentinels(&self) {
        for _ in 0..self.context.config.num_workers {
            self.context.queue.push_sentinel();
        }
    }

    /// Joins every worker, giving up on those still running after `timeout`.
    pub(crate) fn join(handles: Vec<JoinHandle<WorkerReport>>, timeout: Duration) -> JoinOutcome {
        let deadline = deadline_after(timeout);
        let mut pending = handles;
        let mut outcome = JoinOutcome::default();

        loop {
            let (finished, running): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(JoinHandle::is_finished);

            for handle in finished {
                match handle.join() {
                    Ok(report) => outcome.reports.push(report),
                    Err(_) => {
                        error!("Worker thread panicked");
                        outcome.panicked += 1;
                    }
                }
            }

            pending = running;
            if pending.is_empty() || deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            std::thread::sleep(JOIN_POLL_INTERVAL);
        }

        for handle in pending {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            warn!(thread = %name, "Worker did not exit before the join timeout, leaving it behind");
            outcome.leaked += 1;
        }

        outcome
    }
}
