//! The breadth-first frontier: work queue, tasks and dedup registry.
//!
//! This module provides:
//! - `Task`, an immutable `(query, depth)` unit of work
//! - `FrontierQueue`, a FIFO with timed dequeue and a drain barrier
//! - `DedupRegistry`, atomic claims over processed queries and seen results

mod queue;
mod registry;
mod task;

pub(crate) use queue::deadline_after;
pub use queue::{Dequeued, DrainStatus, FrontierQueue};
pub use registry::DedupRegistry;
pub use task::Task;
