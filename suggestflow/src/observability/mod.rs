//! Observability hooks for crawl runs.

mod observer;
mod summary;

pub use observer::{
    CollectingCrawlObserver, CrawlEvent, CrawlObserver, LoggingCrawlObserver, NoOpCrawlObserver,
};
pub use summary::{CrawlStats, CrawlSummary, ShutdownReason};
