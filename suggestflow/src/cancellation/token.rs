//! Interrupt flag shared by a crawl's coordinator, workers and signal listener.

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Hook run once when a run is interrupted.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// One-shot interrupt flag with wake-up hooks.
///
/// The first [`cancel`](Self::cancel) wins: its reason is kept and the hooks
/// run on that thread. Later calls are no-ops.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
    hooks: RwLock<Vec<CancelCallback>>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupts the run.
    ///
    /// Returns `true` for the call that flipped the flag. A panicking hook is
    /// logged and does not stop the remaining hooks.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%reason, "Ignoring repeated cancellation");
            return false;
        }
        *self.reason.write() = Some(reason);

        for hook in self.hooks.read().iter() {
            run_hook(hook.as_ref());
        }
        true
    }

    /// Registers a hook to run on cancellation.
    ///
    /// Runs it right away if the token is already cancelled.
    pub fn on_cancel<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        // Checked under the write lock so a concurrent cancel either sees the
        // new hook or is seen here.
        let mut hooks = self.hooks.write();
        if self.is_cancelled() {
            drop(hooks);
            run_hook(&hook);
        } else {
            hooks.push(Box::new(hook));
        }
    }

    /// Whether the run has been interrupted.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Why the run was interrupted, once it has been.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }
}

fn run_hook(hook: &(dyn Fn() + Send + Sync)) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(hook)) {
        warn!(?payload, "Cancellation hook panicked");
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .field("hooks", &self.hooks.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_hook(token: &CancellationToken) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        token.on_cancel(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn test_fresh_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.reason(), None);
    }

    #[test]
    fn test_first_reason_wins() {
        let token = CancellationToken::new();
        assert!(token.cancel("interrupted by user"));
        assert!(!token.cancel("worker spawn failed"));
        assert_eq!(token.reason().as_deref(), Some("interrupted by user"));
    }

    #[test]
    fn test_hook_runs_once() {
        let token = CancellationToken::new();
        let hits = counting_hook(&token);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        token.cancel("first");
        token.cancel("second");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_hook_runs_immediately() {
        let token = CancellationToken::new();
        token.cancel("early");
        let hits = counting_hook(&token);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_hook_does_not_block_others() {
        let token = CancellationToken::new();
        token.on_cancel(|| panic!("hook failure"));
        let hits = counting_hook(&token);

        assert!(token.cancel("test"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_from_signal_thread() {
        let token = Arc::new(CancellationToken::new());
        let remote = Arc::clone(&token);

        std::thread::spawn(move || remote.cancel("signal"))
            .join()
            .unwrap();

        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("signal"));
    }
}
