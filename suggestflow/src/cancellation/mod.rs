//! Cooperative cancellation for crawl runs.
//!
//! A [`CancellationToken`] is shared by the coordinator, every worker and the
//! interrupt listener. Workers poll it at the top of each loop iteration;
//! callbacks registered with [`CancellationToken::on_cancel`] let blocked
//! components (the frontier queue) wake up promptly.

mod token;

pub use token::{CancelCallback, CancellationToken};
