//! HTTP fetch executor
//!
//! This module handles all page-level HTTP requests, including:
//! - Building HTTP clients with browser-like headers
//! - GET requests with a fixed per-attempt timeout
//! - A bounded retry loop with randomized backoff
//! - Error classification
//!
//! A single page failing is never fatal to the larger crawl: after the
//! attempt budget is exhausted the failure is surfaced as a terminal
//! [`FetchOutcome::Failed`] and the caller skips that unit of work.

use crate::config::{CrawlerConfig, DelayRange, HeaderConfig};
use crate::crawler::limiter::polite_pause;
use crate::shutdown::ShutdownHandle;
use crate::ConfigError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// HTTP status code
        status: u16,
        /// Page body content
        body: String,
    },

    /// All attempts failed; the last failure reason is carried along.
    ///
    /// Every individual attempt failure is retryable (network errors,
    /// timeouts, non-2xx statuses); this variant is what remains once the
    /// attempt budget is spent.
    Failed { reason: String, attempts: u32 },

    /// Shutdown was requested before or between attempts
    Cancelled,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Builds an HTTP client with browser-like default headers
///
/// # Arguments
///
/// * `headers` - The header configuration (user agent, accept, language)
/// * `timeout_secs` - Per-request timeout in seconds
/// * `cookie_store` - Whether the client keeps a cookie jar (session use)
pub fn build_http_client(
    headers: &HeaderConfig,
    timeout_secs: u64,
    cookie_store: bool,
) -> crate::Result<Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_str(&headers.accept)
            .map_err(|e| ConfigError::Validation(format!("accept header: {}", e)))?,
    );
    default_headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&headers.accept_language)
            .map_err(|e| ConfigError::Validation(format!("accept-language header: {}", e)))?,
    );

    let client = Client::builder()
        .user_agent(headers.user_agent.clone())
        .default_headers(default_headers)
        .timeout(Duration::from_secs(timeout_secs))
        .cookie_store(cookie_store)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches URLs with a bounded retry loop
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Network error | Retry after backoff |
/// | Timeout | Retry after backoff |
/// | Non-2xx status | Retry after backoff |
/// | Attempts exhausted | Terminal `Failed` |
/// | Shutdown requested | `Cancelled`, no further attempts |
///
/// The backoff window is wider than the inter-request politeness delay to
/// reduce correlation with whatever caused the failure.
pub struct Fetcher {
    client: Client,
    max_attempts: u32,
    backoff: DelayRange,
}

impl Fetcher {
    /// Creates a fetcher around an existing client.
    ///
    /// The client may carry a session cookie jar; responses update it as a
    /// side effect, which is the only way session state changes mid-crawl.
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_attempts: config.max_attempts,
            backoff: config.retry_backoff,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches a URL, retrying transient failures up to the attempt budget.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `referer` - Optional Referer header for hosts that require one
    /// * `shutdown` - Checked before every attempt and during backoff
    pub async fn fetch(
        &self,
        url: &str,
        referer: Option<&str>,
        shutdown: &ShutdownHandle,
    ) -> FetchOutcome {
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            if shutdown.is_requested() {
                return FetchOutcome::Cancelled;
            }

            match self.attempt(url, referer).await {
                Ok((status, body)) => {
                    tracing::debug!("Fetched {} ({})", url, status);
                    return FetchOutcome::Success { status, body };
                }
                Err(reason) => {
                    tracing::warn!(
                        "Request failed for {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.max_attempts,
                        reason
                    );
                    last_reason = reason;

                    if attempt < self.max_attempts {
                        polite_pause(&self.backoff, shutdown).await;
                    }
                }
            }
        }

        FetchOutcome::Failed {
            reason: last_reason,
            attempts: self.max_attempts,
        }
    }

    /// One GET attempt. Any failure is retryable.
    async fn attempt(&self, url: &str, referer: Option<&str>) -> Result<(u16, String), String> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Err(classify_request_error(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(format!("unexpected status {}", status));
        }

        match response.text().await {
            Ok(body) => Ok((status.as_u16(), body)),
            Err(e) => Err(format!("failed reading body: {}", e)),
        }
    }
}

fn classify_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    }
}
