//! Suggestion providers.
//!
//! This module provides:
//! - The `SuggestionProvider` protocol consumed by workers
//! - Keyword filtering applied to every lookup
//! - An HTTP provider for the autocomplete toolbar endpoint (`http` feature)

#[cfg(feature = "http")]
mod http;
mod protocols;

#[cfg(feature = "http")]
pub use http::{parse_suggestions, HttpSuggestionProvider};
#[cfg(test)]
pub use protocols::MockSuggestionProvider;
pub use protocols::{filter_candidates, matches_keyword, normalize_candidate, SuggestionProvider};
