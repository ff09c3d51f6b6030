//! Protocol trait for suggestion lookups.

use std::sync::Arc;

use crate::errors::CrawlResult;

/// Source of autocomplete suggestions.
///
/// Implementations may block on I/O. They are called without any crawl lock
/// held, from several worker threads at once.
#[cfg_attr(test, mockall::automock)]
pub trait SuggestionProvider: Send + Sync {
    /// Returns the provider's suggestions for `query`, in provider order.
    ///
    /// Errors are recovered by the caller, which treats the lookup as empty.
    fn lookup(&self, query: &str) -> CrawlResult<Vec<String>>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "provider"
    }
}

impl<P: SuggestionProvider + ?Sized> SuggestionProvider for Arc<P> {
    fn lookup(&self, query: &str) -> CrawlResult<Vec<String>> {
        (**self).lookup(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Whether `candidate` contains `keyword`, ignoring case.
#[must_use]
pub fn matches_keyword(candidate: &str, keyword: &str) -> bool {
    candidate.to_lowercase().contains(&keyword.to_lowercase())
}

/// Replaces line breaks with spaces so a candidate fits on one output line.
#[must_use]
pub fn normalize_candidate(candidate: &str) -> String {
    candidate.replace(['\r', '\n'], " ")
}

/// Keeps the candidates that contain `keyword`, ignoring case, in their original order.
///
/// Candidates are normalized first, so the registry, the result file and
/// the follow-up query all see the same string.
#[must_use]
pub fn filter_candidates(candidates: Vec<String>, keyword: &str) -> Vec<String> {
    let keyword = keyword.to_lowercase();
    candidates
        .into_iter()
        .map(|candidate| {
            if candidate.contains(['\r', '\n']) {
                normalize_candidate(&candidate)
            } else {
                candidate
            }
        })
        .filter(|candidate| candidate.to_lowercase().contains(&keyword))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CrawlError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_matches_keyword_ignores_case() {
        assert!(matches_keyword("Rust Lang", "rust"));
        assert!(matches_keyword("trusty", "RUST"));
        assert!(!matches_keyword("go lang", "rust"));
    }

    #[test]
    fn test_filter_candidates_keeps_order() {
        let candidates = vec![
            "rust lang".to_string(),
            "go lang".to_string(),
            "rustacean".to_string(),
        ];
        assert_eq!(
            filter_candidates(candidates, "rust"),
            vec!["rust lang".to_string(), "rustacean".to_string()]
        );
    }

    #[test]
    fn test_filter_candidates_normalizes_line_breaks() {
        let candidates = vec!["rust\nbook".to_string(), "rust\r\nlang".to_string()];
        assert_eq!(
            filter_candidates(candidates, "rust"),
            vec!["rust book".to_string(), "rust  lang".to_string()]
        );
        assert_eq!(normalize_candidate("plain"), "plain");
    }

    #[test]
    fn test_filter_candidates_empty() {
        assert!(filter_candidates(Vec::new(), "rust").is_empty());
    }

    #[test]
    fn test_mock_provider_through_arc() {
        let mut mock = MockSuggestionProvider::new();
        mock.expect_lookup().times(2).returning(|q| match q {
            "rust" => Ok(vec!["rust lang".to_string()]),
            other => Err(CrawlError::transport(other, "refused")),
        });

        let provider: Arc<MockSuggestionProvider> = Arc::new(mock);
        assert_eq!(provider.lookup("rust").unwrap(), vec!["rust lang".to_string()]);
        assert!(provider.lookup("broken").unwrap_err().is_lookup_failure());
    }
}
