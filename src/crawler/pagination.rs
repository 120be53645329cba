//! Pagination-extent discovery
//!
//! Upstream pagination markup is not guaranteed stable, so the discoverer
//! layers three strategies and always produces a usable page count:
//!
//! 1. A "current page of total" text marker on the first listing page
//! 2. The maximum integer label in the pagination-links section
//! 3. The level's configured known page count
//!
//! The marker's total-page token can be a multi-digit concatenation artifact
//! of adjacent markup, so only its first digit is trusted. The sites in use
//! have single-digit-leading maximum page counts; see DESIGN.md before
//! generalizing this.

use crate::config::{LevelEntry, VocabConfig};
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::shutdown::ShutdownHandle;
use regex::Regex;
use scraper::{Html, Selector};

/// The inclusive page span of one listing. Computed once, immutable after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Creates a range starting at page 1.
    pub fn new(end: u32) -> Self {
        debug_assert!(end >= 1);
        Self { start: 1, end }
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Expands the listing URL template for a level.
pub fn listing_url(template: &str, level: u8) -> String {
    template.replace("{level}", &level.to_string())
}

/// Builds the URL for one page of a listing.
///
/// Page 1 is the listing URL itself; later pages append `page/{n}/`.
pub fn page_url(listing: &str, page: u32) -> String {
    if page <= 1 {
        return listing.to_string();
    }

    if listing.ends_with('/') {
        format!("{}page/{}/", listing, page)
    } else {
        format!("{}/page/{}/", listing, page)
    }
}

/// Determines how many pages a level's listing spans.
///
/// Fetches the first listing page and applies the layered strategies; a
/// fetch failure or an implausible value (zero, or beyond `page_bound`)
/// falls through to the level's known page count. Discovery never fails.
pub async fn discover(
    fetcher: &Fetcher,
    vocab: &VocabConfig,
    page_bound: u32,
    entry: &LevelEntry,
    shutdown: &ShutdownHandle,
) -> PageRange {
    let listing = listing_url(&vocab.listing_url_template, entry.level);

    let discovered = match fetcher.fetch(&listing, None, shutdown).await {
        FetchOutcome::Success { body, .. } => discover_from_body(&body, vocab),
        FetchOutcome::Failed { reason, .. } => {
            tracing::warn!(
                "Could not fetch {} for page discovery: {}",
                listing,
                reason
            );
            None
        }
        FetchOutcome::Cancelled => None,
    };

    let end = match discovered {
        Some(pages) if pages >= 1 && pages <= page_bound => {
            tracing::info!("Level {}: discovered {} pages", entry.level, pages);
            pages
        }
        Some(pages) => {
            tracing::warn!(
                "Level {}: discovered page count {} is implausible, using known count {}",
                entry.level,
                pages,
                entry.known_pages
            );
            entry.known_pages
        }
        None => {
            tracing::info!(
                "Level {}: no pagination found, using known count {}",
                entry.level,
                entry.known_pages
            );
            entry.known_pages
        }
    };

    PageRange::new(end)
}

/// Applies the marker and link-label strategies to a fetched body.
pub fn discover_from_body(body: &str, vocab: &VocabConfig) -> Option<u32> {
    let document = Html::parse_document(body);

    if let Some(total) = marker_total(&document, &vocab.marker_pattern) {
        tracing::debug!("Page marker yielded {} pages", total);
        return Some(total);
    }

    if let Some(total) = link_label_max(&document, &vocab.selectors.pagination_links) {
        tracing::debug!("Pagination links yielded {} pages", total);
        return Some(total);
    }

    None
}

/// Scans the rendered page text for the total-page marker.
///
/// Only the first digit of the captured token is trusted.
fn marker_total(document: &Html, pattern: &str) -> Option<u32> {
    let marker = Regex::new(pattern).ok()?;
    let text: String = document.root_element().text().collect();

    let captures = marker.captures(&text)?;
    let token = captures.get(1)?.as_str();
    if token.len() > 1 {
        tracing::debug!(
            "Marker token '{}' is multi-digit, keeping only the first digit",
            token
        );
    }

    token.chars().next()?.to_digit(10)
}

/// Takes the maximum integer label among the pagination links.
fn link_label_max(document: &Html, selector: &str) -> Option<u32> {
    let links = Selector::parse(selector).ok()?;

    document
        .select(&links)
        .filter_map(|element| {
            let label: String = element.text().collect();
            label.trim().parse::<u32>().ok()
        })
        .max()
}
