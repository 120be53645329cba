//! Authenticated resource downloads
//!
//! Each media item resolves through its detail page to an original-resource
//! URL, then streams to disk in chunks so peak memory stays bounded
//! regardless of resource size. Destinations are deterministic, and an
//! existing destination satisfies the task without any outbound request,
//! which makes repeated runs safe and cheap.
//!
//! Every resource fetch carries a Referer equal to the originating detail
//! page URL. The upstream host rejects requests without it; this is a
//! protocol requirement, not an optional header.

use crate::config::{CrawlerConfig, RankingConfig};
use crate::crawler::{FetchOutcome, Fetcher};
use crate::extract::{find_original_url, MediaItem};
use crate::session::Session;
use crate::shutdown::ShutdownHandle;
use reqwest::header::REFERER;
use reqwest::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Download failure modes
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Resource fetch failed; the item is skipped, the batch continues
    #[error("resource fetch failed for {url}: {reason}")]
    Http { url: String, reason: String },

    /// Local write failed; aborts the batch for this destination tree
    #[error("failed writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How a download task was satisfied.
#[derive(Debug)]
pub enum DownloadStatus {
    Downloaded(PathBuf),
    /// Destination already existed; no request was made
    AlreadyPresent(PathBuf),
}

/// One resolved unit of download work.
///
/// The destination is deterministic from the item identity, sanitized
/// title/author, and the resource extension, so re-running the crawl is
/// idempotent.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub item: MediaItem,
    pub original_url: String,
    pub dest: PathBuf,
}

/// Resolves detail pages and streams resources to disk.
pub struct DownloadManager {
    fetcher: Fetcher,
    client: Client,
    images_dir: PathBuf,
    site_referer: String,
}

impl DownloadManager {
    /// Creates a manager over an authenticated session.
    pub fn new(
        session: &Session,
        crawler: &CrawlerConfig,
        ranking: &RankingConfig,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(session.client().clone(), crawler),
            client: session.client().clone(),
            images_dir: images_dir.into(),
            site_referer: ranking.referer.clone(),
        }
    }

    /// Resolves an item's detail page to its original-resource URL.
    ///
    /// `None` covers both an unreachable detail page and a page without the
    /// embedded original marker; either way the item is skipped.
    pub async fn resolve(&self, item: &MediaItem, shutdown: &ShutdownHandle) -> Option<String> {
        match self
            .fetcher
            .fetch(&item.detail_url, Some(&self.site_referer), shutdown)
            .await
        {
            FetchOutcome::Success { body, .. } => {
                let url = find_original_url(&body);
                if url.is_none() {
                    tracing::warn!("No original resource marker on {}", item.detail_url);
                }
                url
            }
            FetchOutcome::Failed { reason, .. } => {
                tracing::warn!("Detail page {} unreachable: {}", item.detail_url, reason);
                None
            }
            FetchOutcome::Cancelled => None,
        }
    }

    /// Builds the task for a resolved item.
    pub fn task_for(&self, item: &MediaItem, original_url: String) -> DownloadTask {
        let dest = destination(&self.images_dir, item, &original_url);
        DownloadTask {
            item: item.clone(),
            original_url,
            dest,
        }
    }

    /// Streams a resource to its destination.
    ///
    /// Writes go to a `.part` file renamed into place on completion, so an
    /// interrupted transfer never leaves a destination that a later run
    /// would mistake for a finished download.
    pub async fn download(&self, task: &DownloadTask) -> Result<DownloadStatus, DownloadError> {
        if task.dest.exists() {
            tracing::info!("Already present: {}", task.dest.display());
            return Ok(DownloadStatus::AlreadyPresent(task.dest.clone()));
        }

        if let Some(parent) = task.dest.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DownloadError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut response = self
            .client
            .get(&task.original_url)
            .header(REFERER, task.item.detail_url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::Http {
                url: task.original_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http {
                url: task.original_url.clone(),
                reason: format!("status {}", status),
            });
        }

        let part = part_path(&task.dest);
        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|source| DownloadError::Io {
                path: part.clone(),
                source,
            })?;

        loop {
            let chunk = response.chunk().await.map_err(|e| DownloadError::Http {
                url: task.original_url.clone(),
                reason: e.to_string(),
            })?;

            match chunk {
                Some(bytes) => {
                    file.write_all(&bytes)
                        .await
                        .map_err(|source| DownloadError::Io {
                            path: part.clone(),
                            source,
                        })?;
                }
                None => break,
            }
        }

        file.flush().await.map_err(|source| DownloadError::Io {
            path: part.clone(),
            source,
        })?;
        drop(file);

        tokio::fs::rename(&part, &task.dest)
            .await
            .map_err(|source| DownloadError::Io {
                path: task.dest.clone(),
                source,
            })?;

        tracing::info!("Downloaded {}", task.dest.display());
        Ok(DownloadStatus::Downloaded(task.dest.clone()))
    }
}

/// Computes the deterministic destination path for an item.
pub fn destination(dir: &Path, item: &MediaItem, original_url: &str) -> PathBuf {
    let file_name = format!(
        "{}_{}_{}.{}",
        item.id,
        sanitize_component(&item.title),
        sanitize_component(&item.author),
        extension_of(original_url)
    );
    dir.join(file_name)
}

/// Strips characters that are illegal in file names.
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect()
}

/// Takes the resource extension from the final path segment of a URL.
fn extension_of(url: &str) -> &str {
    let trimmed = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);

    match trimmed.rsplit('.').next() {
        Some(ext) if !ext.is_empty() && !ext.contains('/') => ext,
        _ => "bin",
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
