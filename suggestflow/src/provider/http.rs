//! Autocomplete provider backed by the suggestion toolbar endpoint.
//!
//! The endpoint answers `GET ?output=toolbar&hl=<lang>&q=<query>` with an XML
//! document of the form
//!
//! ```xml
//! <toplevel>
//!   <CompleteSuggestion><suggestion data="rust lang"/></CompleteSuggestion>
//! </toplevel>
//! ```

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::{Html, Selector};
use tracing::debug;

use super::SuggestionProvider;
use crate::config::ProviderConfig;
use crate::errors::{ConfigError, CrawlError, CrawlResult};

/// Blocking HTTP client for the autocomplete endpoint.
#[derive(Debug, Clone)]
pub struct HttpSuggestionProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpSuggestionProvider {
    /// Builds a provider from its configuration.
    ///
    /// Must not be called from inside an async runtime; the blocking client
    /// owns its own.
    pub fn new(config: ProviderConfig) -> CrawlResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ConfigError::new("headers", format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ConfigError::new("headers", format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| CrawlError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl SuggestionProvider for HttpSuggestionProvider {
    fn lookup(&self, query: &str) -> CrawlResult<Vec<String>> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("output", self.config.output_format.as_str()),
                ("hl", self.config.language.as_str()),
                ("q", query),
            ])
            .send()
            .map_err(|e| CrawlError::transport(query, describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::HttpStatus {
                query: query.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| CrawlError::transport(query, describe_transport_error(&e)))?;
        let suggestions = parse_suggestions(query, &body)?;
        debug!(query, count = suggestions.len(), "Fetched suggestions");
        Ok(suggestions)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else if error.is_decode() {
        "decode"
    } else {
        "request"
    };
    format!("{kind}: {error}")
}

/// Extracts the `data` attribute of every `<suggestion>` element, in document order.
///
/// A body without a `<toplevel>` root is treated as malformed; an empty
/// `<toplevel/>` yields no suggestions.
pub fn parse_suggestions(query: &str, body: &str) -> CrawlResult<Vec<String>> {
    let root = selector("toplevel")?;
    let suggestion = selector("suggestion")?;

    let document = Html::parse_document(body);
    if document.select(&root).next().is_none() {
        return Err(CrawlError::malformed(query, "missing <toplevel> element"));
    }

    Ok(document
        .select(&suggestion)
        .filter_map(|element| element.value().attr("data"))
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .map(String::from)
        .collect())
}

fn selector(css: &str) -> CrawlResult<Selector> {
    Selector::parse(css).map_err(|e| CrawlError::Internal(format!("selector '{css}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOOLBAR_BODY: &str = r#"<?xml version="1.0"?><toplevel><CompleteSuggestion><suggestion data="rust lang"/></CompleteSuggestion><CompleteSuggestion><suggestion data="rust &amp; cargo"/></CompleteSuggestion><CompleteSuggestion><suggestion data="go lang"/></CompleteSuggestion></toplevel>"#;

    #[test]
    fn test_parse_suggestions_in_order() {
        let suggestions = parse_suggestions("rust", TOOLBAR_BODY).unwrap();
        assert_eq!(
            suggestions,
            vec![
                "rust lang".to_string(),
                "rust & cargo".to_string(),
                "go lang".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_empty_document() {
        let suggestions =
            parse_suggestions("zzzz", r#"<?xml version="1.0"?><toplevel/>"#).unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_suggestion_body() {
        let err = parse_suggestions("rust", "<html><body>Too many requests</body></html>")
            .unwrap_err();
        assert!(matches!(err, CrawlError::MalformedResponse { .. }));
        assert!(err.is_lookup_failure());

        let err = parse_suggestions("rust", "").unwrap_err();
        assert!(matches!(err, CrawlError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_skips_blank_data() {
        let body = r#"<toplevel><CompleteSuggestion><suggestion data=" "/></CompleteSuggestion><CompleteSuggestion><suggestion/></CompleteSuggestion><CompleteSuggestion><suggestion data="rust"/></CompleteSuggestion></toplevel>"#;
        assert_eq!(parse_suggestions("rust", body).unwrap(), vec!["rust".to_string()]);
    }

    #[test]
    fn test_provider_rejects_invalid_header() {
        let config = ProviderConfig::new().with_header("bad header", "x");
        let err = HttpSuggestionProvider::new(config).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn test_provider_rejects_invalid_config() {
        let err = HttpSuggestionProvider::new(ProviderConfig::new().with_timeout(0.0)).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let config = ProviderConfig::new()
            .with_endpoint("http://127.0.0.1:9/complete/search")
            .with_timeout(1.0);
        let provider = HttpSuggestionProvider::new(config).unwrap();
        assert_eq!(provider.name(), "http");

        let err = provider.lookup("rust").unwrap_err();
        assert!(matches!(err, CrawlError::Transport { .. }));
    }
}
