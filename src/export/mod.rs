//! Normalized CSV export
//!
//! Every record is flattened onto a fixed, ordered schema at this boundary:
//! a missing upstream value is an empty string in its column, never an
//! absent column. Output is UTF-8 with a header row and quote-always
//! quoting, so embedded delimiters and newlines in free-text fields survive
//! round trips.

use crate::extract::WordRecord;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Export failure modes. Local IO problems are fatal for the destination.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// The export schema, in column order.
pub const COLUMNS: [&str; 10] = [
    "id",
    "level",
    "word",
    "reading",
    "meaning",
    "romaji",
    "example_jp",
    "example_en",
    "tags",
    "difficulty",
];

// Field order here is the column order in the file.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    level: &'a str,
    word: &'a str,
    reading: &'a str,
    meaning: &'a str,
    romaji: &'a str,
    example_jp: &'a str,
    example_en: &'a str,
    tags: &'a str,
    difficulty: u8,
}

impl<'a> From<&'a WordRecord> for CsvRow<'a> {
    fn from(record: &'a WordRecord) -> Self {
        Self {
            id: &record.id,
            level: &record.level,
            word: &record.word,
            reading: &record.reading,
            meaning: &record.meaning,
            romaji: &record.romaji,
            example_jp: &record.example_jp,
            example_en: &record.example_en,
            tags: &record.tags,
            difficulty: record.difficulty,
        }
    }
}

/// File name of a per-level export inside the words directory.
pub fn level_file_name(level: u8) -> String {
    format!("jlpt_n{}_words.csv", level)
}

/// Writes records to a CSV file.
///
/// Writing zero records is a no-op with a warning, not an error — a level
/// that yielded nothing should not fail the run. Returns the number of rows
/// written.
pub fn export_words(records: &[WordRecord], path: &Path) -> Result<usize, ExportError> {
    if records.is_empty() {
        tracing::warn!("No records to export, skipping {}", path.display());
        return Ok(0);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)?;

    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    tracing::info!("Exported {} records to {}", records.len(), path.display());
    Ok(records.len())
}
