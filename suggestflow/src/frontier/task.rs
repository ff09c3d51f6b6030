//! Units of traversal work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A query waiting to be expanded, tagged with its distance from the seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    query: String,
    depth: usize,
}

impl Task {
    /// Creates a task at an explicit depth.
    #[must_use]
    pub fn new(query: impl Into<String>, depth: usize) -> Self {
        Self {
            query: query.into(),
            depth,
        }
    }

    /// Creates the depth-0 seed task.
    #[must_use]
    pub fn seed(query: impl Into<String>) -> Self {
        Self::new(query, 0)
    }

    /// Creates a task one hop further from the seed than `self`.
    #[must_use]
    pub fn child(&self, query: impl Into<String>) -> Self {
        Self::new(query, self.depth + 1)
    }

    /// The query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of expansion hops from the seed.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this task may be fetched under the given depth limit.
    #[must_use]
    pub const fn within_depth(&self, max_depth: usize) -> bool {
        self.depth < max_depth
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth={})", self.query, self.depth)
    }
}
