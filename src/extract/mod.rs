//! Structured extraction from fetched documents
//!
//! Extraction is pure and total: a row or item that does not match the
//! expected shape is reported as a skipped unit, never raised past this
//! boundary. All field values are whitespace-trimmed.
//!
//! The embedded-script resource scanner lives in its own module because it
//! is string-pattern matching, not tree parsing; keeping the two strategies
//! apart keeps both testable.

mod ranking;
mod resource;
mod vocab;

pub use ranking::{extract_ranking, ItemOutcome, MediaItem};
pub use resource::find_original_url;
pub use vocab::{extract_rows, RawWord, RowOutcome, WordRecord};
