//! Testing utilities for crawl runs.
//!
//! This module provides scripted suggestion providers that never touch the
//! network.

mod mocks;

pub use mocks::{BranchingSuggestionProvider, StaticSuggestionProvider};
