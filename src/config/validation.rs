use crate::config::types::{
    AuthConfig, Config, CrawlerConfig, DelayRange, OutputConfig, RankingConfig, VocabConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_vocab_config(&config.vocab)?;
    validate_ranking_config(&config.ranking)?;
    validate_auth_config(&config.auth)?;

    if config.headers.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl pacing and retry configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.page_bound < 1 {
        return Err(ConfigError::Validation(
            "page-bound must be >= 1".to_string(),
        ));
    }

    validate_delay_range("page-delay", &config.page_delay)?;
    validate_delay_range("download-delay", &config.download_delay)?;
    validate_delay_range("retry-backoff", &config.retry_backoff)?;
    validate_delay_range("level-pause", &config.level_pause)?;

    Ok(())
}

fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min < 0.0 || !range.min.is_finite() || !range.max.is_finite() {
        return Err(ConfigError::Validation(format!(
            "{} bounds must be finite and non-negative",
            name
        )));
    }

    if range.max < range.min {
        return Err(ConfigError::Validation(format!(
            "{} max ({}) must be >= min ({})",
            name, range.max, range.min
        )));
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.words_dir.is_empty() {
        return Err(ConfigError::Validation(
            "words-dir cannot be empty".to_string(),
        ));
    }

    if config.aggregate_file.is_empty() {
        return Err(ConfigError::Validation(
            "aggregate-file cannot be empty".to_string(),
        ));
    }

    if config.images_dir.is_empty() {
        return Err(ConfigError::Validation(
            "images-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the vocabulary listing configuration
fn validate_vocab_config(config: &VocabConfig) -> Result<(), ConfigError> {
    if !config.listing_url_template.contains("{level}") {
        return Err(ConfigError::Validation(
            "listing-url-template must contain a {level} placeholder".to_string(),
        ));
    }

    // The template must resolve to a parseable URL
    let sample = config.listing_url_template.replace("{level}", "1");
    Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("listing-url-template: {}", e)))?;

    if config.levels.is_empty() {
        return Err(ConfigError::Validation(
            "at least one vocabulary level must be configured".to_string(),
        ));
    }

    for entry in &config.levels {
        if entry.level < 1 || entry.level > 9 {
            return Err(ConfigError::Validation(format!(
                "level must be between 1 and 9, got {}",
                entry.level
            )));
        }

        if entry.known_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "known-pages for level {} must be >= 1",
                entry.level
            )));
        }
    }

    let marker = regex::Regex::new(&config.marker_pattern)
        .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
    if marker.captures_len() < 2 {
        return Err(ConfigError::InvalidPattern(
            "marker-pattern must have a capture group for the total-page token".to_string(),
        ));
    }

    check_selector("vocab.selectors.table", &config.selectors.table)?;
    check_selector("vocab.selectors.row", &config.selectors.row)?;
    check_selector("vocab.selectors.cell", &config.selectors.cell)?;
    check_selector(
        "vocab.selectors.pagination-links",
        &config.selectors.pagination_links,
    )?;

    let highest_cell = config
        .selectors
        .word_cell
        .max(config.selectors.reading_cell)
        .max(config.selectors.meaning_cell);
    if config.selectors.min_cells <= highest_cell {
        return Err(ConfigError::Validation(format!(
            "min-cells ({}) must exceed the highest configured cell index ({})",
            config.selectors.min_cells, highest_cell
        )));
    }

    Ok(())
}

/// Validates the ranking listing configuration
fn validate_ranking_config(config: &RankingConfig) -> Result<(), ConfigError> {
    Url::parse(&config.url).map_err(|e| ConfigError::InvalidUrl(format!("ranking.url: {}", e)))?;

    if config.limit < 1 {
        return Err(ConfigError::Validation(
            "ranking.limit must be >= 1".to_string(),
        ));
    }

    if !config.detail_url_template.contains("{id}") {
        return Err(ConfigError::Validation(
            "detail-url-template must contain an {id} placeholder".to_string(),
        ));
    }

    let sample = config.detail_url_template.replace("{id}", "1");
    Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("detail-url-template: {}", e)))?;

    if config.selectors.id_attr.is_empty() {
        return Err(ConfigError::Validation(
            "ranking.selectors.id-attr cannot be empty".to_string(),
        ));
    }

    check_selector("ranking.selectors.item", &config.selectors.item)?;
    check_selector("ranking.selectors.title", &config.selectors.title)?;
    check_selector("ranking.selectors.author", &config.selectors.author)?;
    check_selector("ranking.selectors.thumbnail", &config.selectors.thumbnail)?;

    Ok(())
}

/// Validates the login flow configuration
fn validate_auth_config(config: &AuthConfig) -> Result<(), ConfigError> {
    Url::parse(&config.login_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("login-url: {}", e)))?;
    Url::parse(&config.fallback_action)
        .map_err(|e| ConfigError::InvalidUrl(format!("fallback-action: {}", e)))?;
    Url::parse(&config.verify_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("verify-url: {}", e)))?;

    if config.logout_marker.is_empty() {
        return Err(ConfigError::Validation(
            "logout-marker cannot be empty".to_string(),
        ));
    }

    // Credentials are optional (the vocabulary crawl needs none), but a lone
    // username or password is always a mistake
    if config.username.is_some() != config.password.is_some() {
        return Err(ConfigError::Validation(
            "username and password must be configured together".to_string(),
        ));
    }

    Ok(())
}

fn check_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    scraper::Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("{}: {}", name, e)))?;
    Ok(())
}
