//! FIFO work queue with timed dequeue and a completion barrier.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::Task;
use crate::cancellation::CancellationToken;

/// What a call to [`FrontierQueue::pop`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// A task to process. Must be acked once handled.
    Task(Task),
    /// A stop signal for exactly one worker. Must be acked.
    Sentinel,
    /// Nothing arrived before the timeout. Not acked.
    TimedOut,
}

/// Outcome of a bounded wait on the drain barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Every pushed entry has been acked.
    Drained,
    /// The token was cancelled first.
    Cancelled,
    /// The wait timed out with entries outstanding.
    Pending,
}

/// `None` when `timeout` is too large to represent as an instant.
pub(crate) fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

#[derive(Debug)]
enum Entry {
    Task(Task),
    Sentinel,
}

#[derive(Debug, Default)]
struct QueueState {
    entries: VecDeque<Entry>,
    /// Entries pushed but not yet acked.
    unfinished: usize,
}

/// Shared frontier of pending tasks.
///
/// Every pushed entry (task or sentinel) counts as unfinished until a matching
/// [`ack`](Self::ack). [`wait_until_drained`](Self::wait_until_drained) returns
/// once that count reaches zero.
#[derive(Debug, Default)]
pub struct FrontierQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    all_done: Condvar,
}

impl FrontierQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a task.
    pub fn push(&self, task: Task) {
        self.push_entry(Entry::Task(task));
    }

    /// Enqueues one stop signal.
    pub fn push_sentinel(&self) {
        self.push_entry(Entry::Sentinel);
    }

    fn push_entry(&self, entry: Entry) {
        let mut state = self.state.lock();
        state.entries.push_back(entry);
        state.unfinished += 1;
        drop(state);
        self.not_empty.notify_one();
    }

    /// Dequeues the oldest entry, waiting up to `timeout` for one to arrive.
    pub fn pop(&self, timeout: Duration) -> Dequeued {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();
        loop {
            match state.entries.pop_front() {
                Some(Entry::Task(task)) => return Dequeued::Task(task),
                Some(Entry::Sentinel) => return Dequeued::Sentinel,
                None => {}
            }
            let Some(deadline) = deadline else {
                self.not_empty.wait(&mut state);
                continue;
            };
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                return match state.entries.pop_front() {
                    Some(Entry::Task(task)) => Dequeued::Task(task),
                    Some(Entry::Sentinel) => Dequeued::Sentinel,
                    None => Dequeued::TimedOut,
                };
            }
        }
    }

    /// Marks one dequeued entry as fully handled.
    ///
    /// Returns `false` if there was nothing outstanding to acknowledge.
    pub fn ack(&self) -> bool {
        let mut state = self.state.lock();
        if state.unfinished == 0 {
            tracing::warn!("ack called with no unfinished entries");
            return false;
        }
        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
        true
    }

    /// Blocks until every pushed entry has been acked.
    pub fn wait_until_drained(&self) {
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            self.all_done.wait(&mut state);
        }
    }

    /// Blocks until drained or until `token` is cancelled.
    ///
    /// Returns `true` if the queue drained. Cancelling the token must be
    /// followed by [`wake_waiters`](Self::wake_waiters) for a parked caller
    /// to notice.
    pub fn wait_until_drained_or_cancelled(&self, token: &CancellationToken) -> bool {
        let mut state = self.state.lock();
        loop {
            if state.unfinished == 0 {
                return true;
            }
            if token.is_cancelled() {
                return false;
            }
            self.all_done.wait(&mut state);
        }
    }

    /// Blocks until drained, cancelled, or `timeout` elapses.
    pub fn wait_for_drain(&self, token: &CancellationToken, timeout: Duration) -> DrainStatus {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();
        loop {
            if state.unfinished == 0 {
                return DrainStatus::Drained;
            }
            if token.is_cancelled() {
                return DrainStatus::Cancelled;
            }
            match deadline {
                Some(deadline) => {
                    if self.all_done.wait_until(&mut state, deadline).timed_out() {
                        return if state.unfinished == 0 {
                            DrainStatus::Drained
                        } else if token.is_cancelled() {
                            DrainStatus::Cancelled
                        } else {
                            DrainStatus::Pending
                        };
                    }
                }
                None => self.all_done.wait(&mut state),
            }
        }
    }

    /// Blocks until drained or until `timeout` elapses. Returns `true` if drained.
    pub fn wait_until_drained_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = deadline_after(timeout) else {
            self.wait_until_drained();
            return true;
        };
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            if self.all_done.wait_until(&mut state, deadline).timed_out() {
                return state.unfinished == 0;
            }
        }
        true
    }

    /// Wakes every thread parked on the drain barrier so it can re-check its exit condition.
    pub fn wake_waiters(&self) {
        let _state = self.state.lock();
        self.all_done.notify_all();
    }

    /// Discards every queued entry, acking each one. Returns how many were discarded.
    pub fn drain_pending(&self) -> usize {
        let mut state = self.state.lock();
        let discarded = state.entries.len();
        state.entries.clear();
        state.unfinished = state.unfinished.saturating_sub(discarded);
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
        discarded
    }

    /// Number of entries waiting to be dequeued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no entries are waiting to be dequeued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Number of pushed entries not yet acked (queued or in flight).
    #[must_use]
    pub fn unfinished(&self) -> usize {
        self.state.lock().unfinished
    }

    /// Whether nothing is queued and nothing is in flight.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        let state = self.state.lock();
        state.entries.is_empty() && state.unfinished == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(20);

    #[test]
    fn test_fifo_order() {
        let queue = FrontierQueue::new();
        queue.push(Task::seed("a"));
        queue.push(Task::new("b", 1));
        queue.push_sentinel();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(SHORT), Dequeued::Task(Task::seed("a")));
        assert_eq!(queue.pop(SHORT), Dequeued::Task(Task::new("b", 1)));
        assert_eq!(queue.pop(SHORT), Dequeued::Sentinel);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_times_out_on_empty_queue() {
        let queue = FrontierQueue::new();
        let start = Instant::now();
        assert_eq!(queue.pop(SHORT), Dequeued::TimedOut);
        assert!(start.elapsed() >= SHORT);
        assert!(queue.is_drained());
    }

    #[test]
    fn test_pop_wakes_on_push() {
        let queue = Arc::new(FrontierQueue::new());
        let producer = queue.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(Task::seed("late"));
        });

        assert_eq!(
            queue.pop(Duration::from_secs(5)),
            Dequeued::Task(Task::seed("late"))
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_ack_tracks_unfinished() {
        let queue = FrontierQueue::new();
        queue.push(Task::seed("a"));
        queue.push(Task::seed("b"));
        assert_eq!(queue.unfinished(), 2);

        let _ = queue.pop(SHORT);
        assert_eq!(queue.unfinished(), 2);
        assert!(!queue.is_drained());

        assert!(queue.ack());
        let _ = queue.pop(SHORT);
        assert!(queue.ack());
        assert!(queue.is_drained());

        assert!(!queue.ack());
        assert_eq!(queue.unfinished(), 0);
    }

    #[test]
    fn test_wait_until_drained() {
        let queue = Arc::new(FrontierQueue::new());
        for i in 0..10 {
            queue.push(Task::new(format!("q{i}"), 0));
        }

        let consumer = queue.clone();
        let handle = thread::spawn(move || {
            while let Dequeued::Task(_) = consumer.pop(SHORT) {
                consumer.ack();
            }
        });

        queue.wait_until_drained();
        assert!(queue.is_drained());
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_until_drained_timeout() {
        let queue = FrontierQueue::new();
        assert!(queue.wait_until_drained_timeout(SHORT));

        queue.push(Task::seed("stuck"));
        assert!(!queue.wait_until_drained_timeout(SHORT));
    }

    #[test]
    fn test_wait_released_by_cancellation() {
        let queue = Arc::new(FrontierQueue::new());
        let token = Arc::new(CancellationToken::new());
        queue.push(Task::seed("never acked"));

        let waiter_queue = queue.clone();
        let waiter_token = token.clone();
        let handle =
            thread::spawn(move || waiter_queue.wait_until_drained_or_cancelled(&waiter_token));

        thread::sleep(Duration::from_millis(20));
        token.cancel("test");
        queue.wake_waiters();

        assert!(!handle.join().unwrap());
    }

    #[test]
    fn test_drain_pending_acks_discarded_entries() {
        let queue = FrontierQueue::new();
        queue.push(Task::seed("in flight"));
        queue.push(Task::seed("queued 1"));
        queue.push(Task::seed("queued 2"));

        let _ = queue.pop(SHORT);
        assert_eq!(queue.drain_pending(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.unfinished(), 1);

        queue.ack();
        assert!(queue.is_drained());
    }

    #[test]
    fn test_unbounded_timeouts_do_not_overflow() {
        let queue = FrontierQueue::new();
        queue.push(Task::seed("rust"));

        assert_eq!(queue.pop(Duration::MAX), Dequeued::Task(Task::seed("rust")));
        queue.ack();
        assert!(queue.wait_until_drained_timeout(Duration::MAX));
        assert!(deadline_after(Duration::MAX).is_none());
    }

    #[test]
    fn test_wait_for_drain_statuses() {
        let queue = FrontierQueue::new();
        let token = CancellationToken::new();
        assert_eq!(queue.wait_for_drain(&token, SHORT), DrainStatus::Drained);

        queue.push(Task::seed("outstanding"));
        assert_eq!(queue.wait_for_drain(&token, SHORT), DrainStatus::Pending);

        token.cancel("test");
        assert_eq!(
            queue.wait_for_drain(&token, Duration::MAX),
            DrainStatus::Cancelled
        );
    }
}
