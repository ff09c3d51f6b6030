//! In-memory result sink.

use parking_lot::Mutex;
use std::sync::Arc;

use super::ResultSink;
use crate::errors::CrawlResult;

/// A sink that collects records in a shared vector.
///
/// Clones share storage, so a test can keep one handle and give the other
/// to a crawl.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultSink {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemoryResultSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records in append order.
    #[must_use]
    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }
}

impl ResultSink for MemoryResultSink {
    fn append(&mut self, record: &str) -> CrawlResult<()> {
        self.records.lock().push(record.to_string());
        Ok(())
    }

    fn records_written(&self) -> usize {
        self.records.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_records() {
        let observer = MemoryResultSink::new();
        let mut writer = observer.clone();

        writer.append("rust lang").unwrap();
        writer.append("rustacean").unwrap();

        assert_eq!(observer.records(), vec!["rust lang", "rustacean"]);
        assert_eq!(observer.records_written(), 2);
        assert!(observer.location().is_none());
    }
}
