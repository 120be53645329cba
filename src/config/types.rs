use serde::Deserialize;

/// Main configuration structure for Shiori
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub headers: HeaderConfig,
    pub output: OutputConfig,
    pub vocab: VocabConfig,
    pub ranking: RankingConfig,
    pub auth: AuthConfig,
}

/// Crawl pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Attempts per fetch before the failure becomes terminal
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Per-attempt request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Upper clamp on any discovered page count
    #[serde(rename = "page-bound")]
    pub page_bound: u32,

    /// Politeness pause between two listing-page fetches
    #[serde(rename = "page-delay")]
    pub page_delay: DelayRange,

    /// Politeness pause between two resource downloads
    #[serde(rename = "download-delay")]
    pub download_delay: DelayRange,

    /// Backoff window between retry attempts (wider than the politeness pause)
    #[serde(rename = "retry-backoff")]
    pub retry_backoff: DelayRange,

    /// Pause between two vocabulary levels
    #[serde(rename = "level-pause")]
    pub level_pause: DelayRange,
}

/// A randomized delay window in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

/// Browser-like headers sent with every outbound request
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    pub accept: String,
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for per-level and aggregate CSV files
    #[serde(rename = "words-dir")]
    pub words_dir: String,

    /// File name of the aggregate CSV inside `words-dir`
    #[serde(rename = "aggregate-file")]
    pub aggregate_file: String,

    /// Directory for downloaded artwork
    #[serde(rename = "images-dir")]
    pub images_dir: String,
}

/// Vocabulary listing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VocabConfig {
    /// Listing URL with a `{level}` placeholder
    #[serde(rename = "listing-url-template")]
    pub listing_url_template: String,

    /// Levels to crawl, in crawl order
    pub levels: Vec<LevelEntry>,

    /// Pattern matching the "current page of total" text marker; the first
    /// capture group is the total-page token
    #[serde(rename = "marker-pattern")]
    pub marker_pattern: String,

    pub selectors: VocabSelectors,
}

/// One vocabulary level with its fallback page count
#[derive(Debug, Clone, Deserialize)]
pub struct LevelEntry {
    pub level: u8,

    /// Known page count used when discovery yields nothing plausible
    #[serde(rename = "known-pages")]
    pub known_pages: u32,
}

/// Selector set for the vocabulary table
#[derive(Debug, Clone, Deserialize)]
pub struct VocabSelectors {
    pub table: String,
    pub row: String,
    pub cell: String,

    /// Links section scanned for the maximum page-number label
    #[serde(rename = "pagination-links")]
    pub pagination_links: String,

    /// Minimum cells a row needs to be considered well-formed
    #[serde(rename = "min-cells")]
    pub min_cells: usize,

    #[serde(rename = "word-cell")]
    pub word_cell: usize,

    #[serde(rename = "reading-cell")]
    pub reading_cell: usize,

    #[serde(rename = "meaning-cell")]
    pub meaning_cell: usize,
}

/// Ranking listing configuration for the download workflow
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Ranking page URL (without the mode query parameter)
    pub url: String,

    /// Ranking mode appended as `?mode=...`
    pub mode: String,

    /// Items to download per run
    pub limit: usize,

    /// Detail page URL with an `{id}` placeholder
    #[serde(rename = "detail-url-template")]
    pub detail_url_template: String,

    /// Referer sent when fetching listing and detail pages
    pub referer: String,

    pub selectors: RankingSelectors,
}

/// Selector set for the ranking listing
#[derive(Debug, Clone, Deserialize)]
pub struct RankingSelectors {
    pub item: String,

    /// Attribute on the item element carrying the external id
    #[serde(rename = "id-attr")]
    pub id_attr: String,

    pub title: String,
    pub author: String,
    pub thumbnail: String,
}

/// Login flow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "login-url")]
    pub login_url: String,

    /// Submission endpoint used when the form declares no action
    #[serde(rename = "fallback-action")]
    pub fallback_action: String,

    /// Authenticated-only page fetched to verify the login took
    #[serde(rename = "verify-url")]
    pub verify_url: String,

    /// Signed-in marker looked for on the verify page (besides the username)
    #[serde(rename = "logout-marker")]
    pub logout_marker: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Additional fields submitted with the login form
    #[serde(rename = "extra-fields", default)]
    pub extra_fields: std::collections::BTreeMap<String, String>,
}
