//! Crawl orchestration
//!
//! This module sequences the two workflows:
//! - the vocabulary crawl: per level, discover pagination, fetch each page
//!   with politeness pauses, extract rows, export per-level and aggregate CSV
//! - the authenticated download batch: login, fetch the ranking listing,
//!   resolve each item and stream it to disk
//!
//! Both workflows are strictly sequential within their request sequences; a
//! failing page or item is contained, logged, and skipped, while setup
//! failures (output directory, authentication) escalate to the caller.

use crate::config::Config;
use crate::context::CrawlContext;
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::limiter::polite_pause;
use crate::crawler::pagination::{discover, listing_url, page_url, PageRange};
use crate::download::{DownloadError, DownloadManager, DownloadStatus};
use crate::export::{export_words, level_file_name};
use crate::extract::{extract_ranking, extract_rows, ItemOutcome, MediaItem, RowOutcome, WordRecord};
use crate::session::{login, Credentials};
use crate::shutdown::ShutdownHandle;
use crate::ShioriError;
use std::path::Path;

/// Per-level result of the vocabulary crawl.
#[derive(Debug)]
pub struct LevelReport {
    pub level: u8,
    pub records: usize,
    pub skips: usize,
}

/// Result of a full vocabulary crawl run.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    pub levels: Vec<LevelReport>,
    pub total_records: usize,
    pub total_skips: usize,
}

/// Runs the vocabulary crawl across all configured levels.
pub async fn run_vocab_crawl(
    config: &Config,
    shutdown: &ShutdownHandle,
) -> Result<CrawlSummary, ShioriError> {
    let words_dir = Path::new(&config.output.words_dir);
    std::fs::create_dir_all(words_dir)?;

    let client = build_http_client(&config.headers, config.crawler.request_timeout_secs, false)?;
    let fetcher = Fetcher::new(client, &config.crawler);

    let mut summary = CrawlSummary::default();
    let mut all_records: Vec<WordRecord> = Vec::new();
    let level_count = config.vocab.levels.len();

    for (index, entry) in config.vocab.levels.iter().enumerate() {
        if shutdown.is_requested() {
            tracing::warn!("Shutdown requested, stopping before level N{}", entry.level);
            break;
        }

        tracing::info!("Starting level N{}", entry.level);
        let mut ctx = CrawlContext::new(entry.level);

        let range = discover(
            &fetcher,
            &config.vocab,
            config.crawler.page_bound,
            entry,
            shutdown,
        )
        .await;

        crawl_level_pages(&fetcher, config, entry.level, range, &mut ctx, shutdown).await;

        let path = words_dir.join(level_file_name(entry.level));
        export_words(&ctx.records, &path)?;

        tracing::info!(
            "Level N{} complete: {} records, {} skips",
            entry.level,
            ctx.records.len(),
            ctx.skips.len()
        );

        summary.levels.push(LevelReport {
            level: entry.level,
            records: ctx.records.len(),
            skips: ctx.skips.len(),
        });
        summary.total_records += ctx.records.len();
        summary.total_skips += ctx.skips.len();
        all_records.extend(ctx.records);

        if index + 1 < level_count && !shutdown.is_requested() {
            polite_pause(&config.crawler.level_pause, shutdown).await;
        }
    }

    let aggregate = words_dir.join(&config.output.aggregate_file);
    export_words(&all_records, &aggregate)?;

    Ok(summary)
}

/// Fetches and extracts every page of one level's listing.
async fn crawl_level_pages(
    fetcher: &Fetcher,
    config: &Config,
    level: u8,
    range: PageRange,
    ctx: &mut CrawlContext,
    shutdown: &ShutdownHandle,
) {
    let listing = listing_url(&config.vocab.listing_url_template, level);

    for page in range.pages() {
        if shutdown.is_requested() {
            break;
        }

        let url = page_url(&listing, page);
        let unit = format!("level {} page {}", level, page);
        tracing::info!("Fetching page {}/{} of level N{}", page, range.end, level);

        match fetcher.fetch(&url, None, shutdown).await {
            FetchOutcome::Success { body, .. } => {
                match extract_rows(&body, &config.vocab.selectors) {
                    Some(outcomes) => {
                        let mut extracted = 0;
                        for outcome in outcomes {
                            match outcome {
                                RowOutcome::Extracted(raw) => {
                                    let id = ctx.next_id();
                                    ctx.push_record(WordRecord::from_raw(id, level, raw));
                                    extracted += 1;
                                }
                                RowOutcome::Skipped { row, reason } => {
                                    ctx.record_skip(format!("{} row {}", unit, row), reason);
                                }
                            }
                        }
                        tracing::info!(
                            "{}: {} words extracted, {} so far",
                            unit,
                            extracted,
                            ctx.records.len()
                        );
                    }
                    None => ctx.record_skip(unit, "no vocabulary table found"),
                }
            }
            FetchOutcome::Failed { reason, attempts } => {
                ctx.record_skip(
                    unit,
                    format!("fetch failed after {} attempts: {}", attempts, reason),
                );
            }
            FetchOutcome::Cancelled => break,
        }

        // The last page needs no trailing pause
        if page < range.end && !shutdown.is_requested() {
            polite_pause(&config.crawler.page_delay, shutdown).await;
        }
    }
}

/// Result of one download batch.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub requested: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub skipped: usize,
}

/// Runs the authenticated download workflow.
///
/// An [`AuthError`](crate::session::AuthError) aborts the whole workflow
/// before any download is attempted; per-item failures are tallied and the
/// batch continues.
pub async fn run_download_batch(
    config: &Config,
    credentials: Credentials,
    shutdown: &ShutdownHandle,
) -> Result<DownloadSummary, ShioriError> {
    std::fs::create_dir_all(&config.output.images_dir)?;

    let client = build_http_client(&config.headers, config.crawler.request_timeout_secs, true)?;
    let session = login(client, &config.auth, &credentials).await?;

    let fetcher = Fetcher::new(session.client().clone(), &config.crawler);
    let mut summary = DownloadSummary::default();

    let ranking_url = format!("{}?mode={}", config.ranking.url, config.ranking.mode);
    tracing::info!("Fetching ranking listing {}", ranking_url);

    let body = match fetcher
        .fetch(&ranking_url, Some(&config.ranking.referer), shutdown)
        .await
    {
        FetchOutcome::Success { body, .. } => body,
        FetchOutcome::Failed { reason, .. } => {
            tracing::error!("Ranking listing unreachable: {}", reason);
            return Ok(summary);
        }
        FetchOutcome::Cancelled => return Ok(summary),
    };

    let mut items: Vec<MediaItem> = Vec::new();
    for outcome in extract_ranking(
        &body,
        &config.ranking.selectors,
        &config.ranking.detail_url_template,
    ) {
        match outcome {
            ItemOutcome::Extracted(item) => items.push(item),
            ItemOutcome::Skipped { index, reason } => {
                tracing::warn!("Skipping ranking item {}: {}", index, reason);
                summary.skipped += 1;
            }
        }
    }
    items.truncate(config.ranking.limit);
    summary.requested = items.len();
    tracing::info!("{} items to download", items.len());

    let manager = DownloadManager::new(
        &session,
        &config.crawler,
        &config.ranking,
        &config.output.images_dir,
    );

    let total = items.len();
    for (index, item) in items.iter().enumerate() {
        if shutdown.is_requested() {
            break;
        }

        tracing::info!("[{}/{}] {} by {}", index + 1, total, item.title, item.author);

        match manager.resolve(item, shutdown).await {
            Some(original_url) => {
                let task = manager.task_for(item, original_url);
                match manager.download(&task).await {
                    Ok(DownloadStatus::Downloaded(_)) => summary.downloaded += 1,
                    Ok(DownloadStatus::AlreadyPresent(_)) => summary.already_present += 1,
                    Err(e @ DownloadError::Io { .. }) => return Err(e.into()),
                    Err(e) => {
                        tracing::warn!("Skipping item {}: {}", item.id, e);
                        summary.skipped += 1;
                    }
                }
            }
            None => {
                tracing::warn!("Skipping item {}: no original resource resolved", item.id);
                summary.skipped += 1;
            }
        }

        if index + 1 < total && !shutdown.is_requested() {
            polite_pause(&config.crawler.download_delay, shutdown).await;
        }
    }

    tracing::info!(
        "Download batch complete: {} downloaded, {} already present, {} skipped",
        summary.downloaded,
        summary.already_present,
        summary.skipped
    );

    Ok(summary)
}
