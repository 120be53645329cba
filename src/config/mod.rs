//! Configuration module for Shiori
//!
//! This module handles loading, parsing, and validating TOML configuration files.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuthConfig, Config, CrawlerConfig, DelayRange, HeaderConfig, LevelEntry, OutputConfig,
    RankingConfig, RankingSelectors, VocabConfig, VocabSelectors,
};

// Re-export parser functions
pub use parser::load_config;
