//! Scripted suggestion providers.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::errors::{CrawlError, CrawlResult};
use crate::provider::SuggestionProvider;

/// A provider that answers from a fixed table.
///
/// Unknown queries return an empty list. Individual queries can be scripted
/// to fail with a transport error or to panic.
#[derive(Debug, Default)]
pub struct StaticSuggestionProvider {
    responses: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    latency: Duration,
    calls: Mutex<Vec<String>>,
}

impl StaticSuggestionProvider {
    /// Creates a provider with no responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the response for one query.
    #[must_use]
    pub fn with_response<I, S>(mut self, query: impl Into<String>, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses
            .insert(query.into(), suggestions.into_iter().map(Into::into).collect());
        self
    }

    /// Makes `query` fail with a transport error.
    #[must_use]
    pub fn with_failure(mut self, query: impl Into<String>) -> Self {
        self.failing.insert(query.into());
        self
    }

    /// Makes `query` panic.
    #[must_use]
    pub fn with_panic(mut self, query: impl Into<String>) -> Self {
        self.panicking.insert(query.into());
        self
    }

    /// Sleeps for `latency` on every lookup.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries looked up so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of lookups made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl SuggestionProvider for StaticSuggestionProvider {
    fn lookup(&self, query: &str) -> CrawlResult<Vec<String>> {
        self.calls.lock().push(query.to_string());
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.panicking.contains(query) {
            panic!("scripted panic for '{query}'");
        }
        if self.failing.contains(query) {
            return Err(CrawlError::transport(query, "scripted failure"));
        }
        Ok(self.responses.get(query).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// A provider that expands every query into `branching` children, forever.
///
/// Query `q` yields `q 0`, `q 1`, ... so every suggestion contains the seed
/// and every suggestion is distinct. Depth limits are what stop a crawl.
#[derive(Debug)]
pub struct BranchingSuggestionProvider {
    branching: usize,
    latency: Duration,
    calls: Mutex<Vec<String>>,
}

impl BranchingSuggestionProvider {
    /// Creates a provider with the given branching factor.
    #[must_use]
    pub fn new(branching: usize) -> Self {
        Self {
            branching,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `latency` on every lookup.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries looked up so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of distinct results a crawl of `max_depth` should find.
    ///
    /// Fetches happen at depths `0..max_depth`, each fetch adds `branching`
    /// children.
    #[must_use]
    pub fn expected_results(&self, max_depth: usize) -> usize {
        (1..=max_depth).map(|level| self.branching.pow(level as u32)).sum()
    }
}

impl SuggestionProvider for BranchingSuggestionProvider {
    fn lookup(&self, query: &str) -> CrawlResult<Vec<String>> {
        self.calls.lock().push(query.to_string());
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok((0..self.branching).map(|i| format!("{query} {i}")).collect())
    }

    fn name(&self) -> &str {
        "branching"
    }
}
