//! Shiori: a polite listing harvester
//!
//! This crate crawls paginated vocabulary listings into normalized CSV files
//! and drives a session-gated artwork download workflow, pacing every request
//! to approximate human browsing cadence.

pub mod config;
pub mod context;
pub mod crawler;
pub mod download;
pub mod export;
pub mod extract;
pub mod session;
pub mod shutdown;

use thiserror::Error;

/// Main error type for Shiori operations
#[derive(Debug, Error)]
pub enum ShioriError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Authentication failed: {0}")]
    Auth(#[from] session::AuthError),

    #[error("Download error: {0}")]
    Download(#[from] download::DownloadError),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),

    #[error("Invalid marker pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Shiori operations
pub type Result<T> = std::result::Result<T, ShioriError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use context::{CrawlContext, SkipNote};
pub use crawler::{FetchOutcome, Fetcher, PageRange};
pub use extract::{MediaItem, WordRecord};
pub use session::Session;
pub use shutdown::ShutdownHandle;
