//! Deduplication registry for queries and results.

use dashmap::DashSet;
use std::collections::HashSet;

/// Tracks which queries have been fetched and which results have been seen.
///
/// Both sets only grow. Callers interact through atomic claims; a claim
/// returns `true` exactly once per distinct string.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    processed_queries: DashSet<String>,
    seen_results: DashSet<String>,
}

impl DedupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `query` for fetching. Returns `false` if it was already claimed.
    pub fn try_claim_query(&self, query: &str) -> bool {
        if self.processed_queries.contains(query) {
            return false;
        }
        self.processed_queries.insert(query.to_string())
    }

    /// Claims `result` for persistence. Returns `false` if it was already seen.
    pub fn try_claim_result(&self, result: &str) -> bool {
        if self.seen_results.contains(result) {
            return false;
        }
        self.seen_results.insert(result.to_string())
    }

    /// Whether `result` has already been claimed.
    #[must_use]
    pub fn has_result(&self, result: &str) -> bool {
        self.seen_results.contains(result)
    }

    /// Number of distinct queries claimed.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.processed_queries.len()
    }

    /// Number of distinct results claimed.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.seen_results.len()
    }

    /// Copies the seen results. Intended for use once workers have stopped.
    #[must_use]
    pub fn snapshot_results(&self) -> HashSet<String> {
        self.seen_results.iter().map(|r| r.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_claims_are_single_use() {
        let registry = DedupRegistry::new();
        assert!(registry.try_claim_query("rust"));
        assert!(!registry.try_claim_query("rust"));

        assert!(!registry.has_result("rust lang"));
        assert!(registry.try_claim_result("rust lang"));
        assert!(!registry.try_claim_result("rust lang"));
        assert!(registry.has_result("rust lang"));

        assert_eq!(registry.query_count(), 1);
        assert_eq!(registry.result_count(), 1);
    }

    #[test]
    fn test_query_and_result_sets_are_independent() {
        let registry = DedupRegistry::new();
        assert!(registry.try_claim_result("rust lang"));
        assert!(registry.try_claim_query("rust lang"));
    }

    #[test]
    fn test_claims_are_case_sensitive() {
        let registry = DedupRegistry::new();
        assert!(registry.try_claim_result("Rust"));
        assert!(registry.try_claim_result("rust"));
        assert_eq!(registry.result_count(), 2);
    }

    #[test]
    fn test_concurrent_claims_win_once() {
        let registry = Arc::new(DedupRegistry::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let winners = winners.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        if registry.try_claim_result(&format!("rust {i}")) {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 100);
        assert_eq!(registry.result_count(), 100);
    }

    #[test]
    fn test_snapshot_results() {
        let registry = DedupRegistry::new();
        registry.try_claim_result("a");
        registry.try_claim_result("b");
        registry.try_claim_result("a");

        let snapshot = registry.snapshot_results();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("a"));
        assert!(snapshot.contains("b"));
    }
}
