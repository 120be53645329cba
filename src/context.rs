//! Per-level crawl state
//!
//! A [`CrawlContext`] carries the id counter, the accumulated records, and
//! the skip diagnostics for one vocabulary level. It is created fresh per
//! level and threaded explicitly through extraction, so record ids are
//! reproducible across runs given identical upstream ordering.

use crate::extract::WordRecord;
use chrono::{DateTime, Utc};

/// A diagnostic for one skipped unit of work (page, row, or item).
///
/// Skips are tallied and reported at the end of a run so operators can judge
/// data completeness.
#[derive(Debug, Clone)]
pub struct SkipNote {
    /// What was skipped, e.g. `"level 5 page 3"` or `"row 12"`
    pub unit: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Mutable state for crawling one vocabulary level.
#[derive(Debug)]
pub struct CrawlContext {
    level: u8,
    next_seq: u32,
    pub records: Vec<WordRecord>,
    pub skips: Vec<SkipNote>,
}

impl CrawlContext {
    /// Creates a fresh context; the id counter starts at 1.
    pub fn new(level: u8) -> Self {
        Self {
            level,
            next_seq: 1,
            records: Vec::new(),
            skips: Vec::new(),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Issues the next record id and advances the counter.
    ///
    /// Ids are zero-padded to four digits and unique within the level. Call
    /// this only once per successfully extracted row.
    pub fn next_id(&mut self) -> String {
        let id = format!("jlpt-n{}-{:04}", self.level, self.next_seq);
        self.next_seq += 1;
        id
    }

    pub fn push_record(&mut self, record: WordRecord) {
        self.records.push(record);
    }

    /// Records a skip diagnostic and logs it.
    pub fn record_skip(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        let unit = unit.into();
        let reason = reason.into();
        tracing::warn!("Skipping {}: {}", unit, reason);
        self.skips.push(SkipNote {
            unit,
            reason,
            at: Utc::now(),
        });
    }
}
