//! Crawler module for page fetching and crawl sequencing
//!
//! This module contains the core crawling machinery, including:
//! - HTTP fetching with a bounded retry loop and randomized backoff
//! - Politeness rate limiting between requests
//! - Pagination-extent discovery with layered fallbacks
//! - Orchestration of the vocabulary and download workflows

mod coordinator;
mod fetcher;
mod limiter;
mod pagination;

pub use coordinator::{
    run_download_batch, run_vocab_crawl, CrawlSummary, DownloadSummary, LevelReport,
};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher};
pub use limiter::{polite_pause, sample_delay};
pub use pagination::{discover, discover_from_body, listing_url, page_url, PageRange};
