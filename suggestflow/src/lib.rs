//! # Suggestflow
//!
//! Concurrent breadth-first expansion of a seed keyword through
//! autocomplete suggestions.
//!
//! Starting from one keyword, a pool of workers asks a suggestion provider
//! for completions, keeps the ones that still contain the keyword, persists
//! each distinct one exactly once and feeds it back as a new query, until a
//! depth limit is reached or the run is interrupted.
//!
//! - **Frontier**: a FIFO work queue with a drain barrier and sentinel shutdown
//! - **Dedup registry**: atomic claims so no query is fetched twice and no
//!   result is written twice
//! - **Result sinks**: line-per-result files flushed on every append
//! - **Cancellation**: interrupt a run from another thread or a signal handler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use suggestflow::prelude::*;
//!
//! let provider = HttpSuggestionProvider::new(ProviderConfig::default())?;
//! let crawler = Crawler::builder(CrawlConfig::new("rust").with_num_workers(4))
//!     .provider(Arc::new(provider))
//!     .build()?;
//!
//! let summary = crawler.run()?;
//! println!("{summary}");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod crawler;
pub mod errors;
pub mod frontier;
pub mod observability;
pub mod provider;
pub mod sink;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{CrawlConfig, ProviderConfig};
    pub use crate::crawler::{Crawler, CrawlerBuilder};
    pub use crate::errors::{ConfigError, CrawlError, CrawlResult, ErrorKind};
    pub use crate::frontier::{DedupRegistry, FrontierQueue, Task};
    pub use crate::observability::{
        CrawlObserver, CrawlStats, CrawlSummary, LoggingCrawlObserver, NoOpCrawlObserver,
        ShutdownReason,
    };
    #[cfg(feature = "http")]
    pub use crate::provider::HttpSuggestionProvider;
    pub use crate::provider::SuggestionProvider;
    pub use crate::sink::{FileResultSink, MemoryResultSink, ResultSink};
}
