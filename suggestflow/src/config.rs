//! Configuration types for crawl runs and the suggestion provider.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

/// Upper bound for every configured duration, one week.
pub const MAX_DURATION_SECONDS: f64 = 7.0 * 24.0 * 3600.0;

/// Converts seconds to a `Duration`, clamped to `0..=MAX_DURATION_SECONDS`.
///
/// NaN maps to zero. `validate()` rejects out-of-range values; the clamp keeps
/// an unvalidated config from panicking.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_DURATION_SECONDS)).unwrap_or(Duration::ZERO)
}

/// Configuration for a single crawl run.
///
/// Fixed for the lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Seed keyword; every persisted result must contain it.
    pub main_keyword: String,
    /// Number of worker threads.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Tasks at this depth or deeper are discarded without fetching.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Directory the result file is created in.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// How long an idle worker waits on the queue before re-checking for completion.
    #[serde(default = "default_queue_timeout")]
    pub queue_timeout_seconds: f64,
    /// Pause after each fetched query.
    #[serde(default = "default_worker_delay")]
    pub worker_delay_seconds: f64,
    /// Join timeout after natural completion.
    #[serde(default = "default_join_timeout")]
    pub join_timeout_seconds: f64,
    /// Join timeout after an interruption.
    #[serde(default = "default_interrupt_join_timeout")]
    pub interrupt_join_timeout_seconds: f64,
    /// Pause between the drain barrier firing and sentinel dispatch.
    #[serde(default)]
    pub settle_delay_seconds: f64,
}

fn default_num_workers() -> usize {
    2
}

fn default_max_depth() -> usize {
    5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_queue_timeout() -> f64 {
    60.0
}

fn default_worker_delay() -> f64 {
    1.0
}

fn default_join_timeout() -> f64 {
    5.0
}

fn default_interrupt_join_timeout() -> f64 {
    2.0
}

impl CrawlConfig {
    /// Creates a configuration for the given seed keyword with defaults.
    #[must_use]
    pub fn new(main_keyword: impl Into<String>) -> Self {
        Self {
            main_keyword: main_keyword.into(),
            num_workers: default_num_workers(),
            max_depth: default_max_depth(),
            output_dir: default_output_dir(),
            queue_timeout_seconds: default_queue_timeout(),
            worker_delay_seconds: default_worker_delay(),
            join_timeout_seconds: default_join_timeout(),
            interrupt_join_timeout_seconds: default_interrupt_join_timeout(),
            settle_delay_seconds: 0.0,
        }
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Sets the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the idle queue timeout.
    #[must_use]
    pub fn with_queue_timeout(mut self, seconds: f64) -> Self {
        self.queue_timeout_seconds = seconds;
        self
    }

    /// Sets the pacing delay between fetches.
    #[must_use]
    pub fn with_worker_delay(mut self, seconds: f64) -> Self {
        self.worker_delay_seconds = seconds;
        self
    }

    /// Sets both join timeouts.
    #[must_use]
    pub fn with_join_timeouts(mut self, natural: f64, interrupted: f64) -> Self {
        self.join_timeout_seconds = natural;
        self.interrupt_join_timeout_seconds = interrupted;
        self
    }

    /// Sets the settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, seconds: f64) -> Self {
        self.settle_delay_seconds = seconds;
        self
    }

    /// The keyword in the form used for queries and matching.
    #[must_use]
    pub fn normalized_keyword(&self) -> String {
        self.main_keyword.trim().to_lowercase()
    }

    /// Gets the queue timeout as a Duration.
    #[must_use]
    pub fn queue_timeout(&self) -> Duration {
        seconds(self.queue_timeout_seconds)
    }

    /// Gets the pacing delay as a Duration.
    #[must_use]
    pub fn worker_delay(&self) -> Duration {
        seconds(self.worker_delay_seconds)
    }

    /// Gets the natural-completion join timeout as a Duration.
    #[must_use]
    pub fn join_timeout(&self) -> Duration {
        seconds(self.join_timeout_seconds)
    }

    /// Gets the interruption join timeout as a Duration.
    #[must_use]
    pub fn interrupt_join_timeout(&self) -> Duration {
        seconds(self.interrupt_join_timeout_seconds)
    }

    /// Gets the settle delay as a Duration.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        seconds(self.settle_delay_seconds)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normalized_keyword().is_empty() {
            return Err(ConfigError::new("main_keyword", "must not be empty"));
        }
        if self.num_workers == 0 {
            return Err(ConfigError::new("num_workers", "must be at least 1"));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::new("max_depth", "must be at least 1"));
        }

        let durations = [
            ("queue_timeout_seconds", self.queue_timeout_seconds),
            ("worker_delay_seconds", self.worker_delay_seconds),
            ("join_timeout_seconds", self.join_timeout_seconds),
            ("interrupt_join_timeout_seconds", self.interrupt_join_timeout_seconds),
            ("settle_delay_seconds", self.settle_delay_seconds),
        ];
        for (field, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::new(field, "must be a non-negative number of seconds"));
            }
            if value > MAX_DURATION_SECONDS {
                return Err(ConfigError::new(
                    field,
                    format!("must be at most {MAX_DURATION_SECONDS} seconds"),
                ));
            }
        }
        if self.queue_timeout_seconds == 0.0 {
            return Err(ConfigError::new("queue_timeout_seconds", "must be greater than zero"));
        }

        Ok(())
    }
}

/// Configuration for the HTTP suggestion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Autocomplete endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Interface language sent as `hl`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Response format sent as `output`.
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: f64,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_endpoint() -> String {
    "https://suggestqueries.google.com/complete/search".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_output_format() -> String {
    "toolbar".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> f64 {
    5.0
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            language: default_language(),
            output_format: default_output_format(),
            user_agent: default_user_agent(),
            timeout_seconds: default_request_timeout(),
            headers: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    /// Creates a new provider configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout_seconds)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::new("endpoint", "must not be empty"));
        }
        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(ConfigError::new("timeout_seconds", "must be greater than zero"));
        }
        if self.timeout_seconds > MAX_DURATION_SECONDS {
            return Err(ConfigError::new(
                "timeout_seconds",
                format!("must be at most {MAX_DURATION_SECONDS} seconds"),
            ));
        }
        Ok(())
    }
}
