//! Append-only stores for discovered suggestions.
//!
//! This module provides:
//! - The `ResultSink` trait
//! - `FileResultSink`, the line-per-result text file used by the CLI
//! - `MemoryResultSink`, an in-process sink for tests and embedding

mod file;
mod memory;

pub use file::{output_path, FileResultSink, OUTPUT_HEADER};
pub use memory::MemoryResultSink;

use crate::errors::CrawlResult;
use std::path::Path;

/// Destination for persisted results.
///
/// Sinks are only touched inside the crawl's recording critical section, so
/// implementations need not synchronize internally.
pub trait ResultSink: Send {
    /// Durably appends one record.
    fn append(&mut self, record: &str) -> CrawlResult<()>;

    /// Number of records appended so far.
    fn records_written(&self) -> usize;

    /// Where the records end up, if they have a filesystem location.
    fn location(&self) -> Option<&Path> {
        None
    }
}
