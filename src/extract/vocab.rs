//! Vocabulary table extraction

use crate::config::VocabSelectors;
use scraper::{ElementRef, Html, Selector};

/// One exported vocabulary record.
///
/// Every field is always present; absent upstream data becomes an empty
/// string so the fixed-schema export stays valid for every row. `romaji` and
/// the example sentences are emitted empty for downstream tooling to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub id: String,
    pub level: String,
    pub word: String,
    pub reading: String,
    pub meaning: String,
    pub romaji: String,
    pub example_jp: String,
    pub example_en: String,
    pub tags: String,
    pub difficulty: u8,
}

impl WordRecord {
    /// Builds a record from a raw row, filling the derived fields.
    pub fn from_raw(id: String, level: u8, raw: RawWord) -> Self {
        Self {
            id,
            level: format!("N{}", level),
            word: raw.word,
            reading: raw.reading,
            meaning: raw.meaning,
            romaji: String::new(),
            example_jp: String::new(),
            example_en: String::new(),
            tags: format!("jlpt-n{}", level),
            difficulty: level,
        }
    }
}

/// The term/reading/gloss triple taken from one well-formed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWord {
    pub word: String,
    pub reading: String,
    pub meaning: String,
}

/// Per-row extraction outcome, tallied by the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Extracted(RawWord),
    Skipped { row: usize, reason: String },
}

/// Extracts vocabulary rows from one listing page.
///
/// Returns `None` when the page has no vocabulary table at all (a page-level
/// skip); otherwise one outcome per table row, in document order. Rows with
/// fewer cells than the selector set requires are skipped.
pub fn extract_rows(body: &str, selectors: &VocabSelectors) -> Option<Vec<RowOutcome>> {
    let document = Html::parse_document(body);

    let table_sel = match Selector::parse(&selectors.table) {
        Ok(sel) => sel,
        Err(_) => return None,
    };
    let row_sel = Selector::parse(&selectors.row).ok()?;
    let cell_sel = Selector::parse(&selectors.cell).ok()?;

    let table = document.select(&table_sel).next()?;

    let mut outcomes = Vec::new();
    for (index, row) in table.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();

        if cells.len() < selectors.min_cells {
            outcomes.push(RowOutcome::Skipped {
                row: index + 1,
                reason: format!(
                    "expected at least {} cells, found {}",
                    selectors.min_cells,
                    cells.len()
                ),
            });
            continue;
        }

        outcomes.push(RowOutcome::Extracted(RawWord {
            word: cell_text(&cells[selectors.word_cell]),
            reading: cell_text(&cells[selectors.reading_cell]),
            meaning: cell_text(&cells[selectors.meaning_cell]),
        }));
    }

    Some(outcomes)
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> VocabSelectors {
        VocabSelectors {
            table: ".jl-table".to_string(),
            row: "tbody tr".to_string(),
            cell: "td".to_string(),
            pagination_links: ".wp-pagenavi a.page".to_string(),
            min_cells: 4,
            word_cell: 1,
            reading_cell: 2,
            meaning_cell: 3,
        }
    }

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body><table class="jl-table"><tbody>{}</tbody></table></body></html>"#,
            rows
        )
    }

    #[test]
    fn test_extract_well_formed_row() {
        let body = page("<tr><td>1</td><td>猫</td><td>ねこ</td><td>cat</td></tr>");
        let outcomes = extract_rows(&body, &selectors()).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0],
            RowOutcome::Extracted(RawWord {
                word: "猫".to_string(),
                reading: "ねこ".to_string(),
                meaning: "cat".to_string(),
            })
        );
    }

    #[test]
    fn test_cell_values_are_trimmed() {
        let body = page("<tr><td>1</td><td>  犬 </td><td> いぬ</td><td> dog </td></tr>");
        let outcomes = extract_rows(&body, &selectors()).unwrap();

        match &outcomes[0] {
            RowOutcome::Extracted(raw) => {
                assert_eq!(raw.word, "犬");
                assert_eq!(raw.reading, "いぬ");
                assert_eq!(raw.meaning, "dog");
            }
            other => panic!("expected extraction, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row_is_skipped_not_fatal() {
        let body = page(
            "<tr><td>1</td><td>山</td><td>やま</td><td>mountain</td></tr>\
             <tr><td>2</td><td>broken</td></tr>\
             <tr><td>3</td><td>川</td><td>かわ</td><td>river</td></tr>",
        );
        let outcomes = extract_rows(&body, &selectors()).unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], RowOutcome::Extracted(_)));
        assert!(matches!(
            outcomes[1],
            RowOutcome::Skipped { row: 2, .. }
        ));
        assert!(matches!(outcomes[2], RowOutcome::Extracted(_)));
    }

    #[test]
    fn test_missing_table_yields_none() {
        let body = "<html><body><p>maintenance</p></body></html>";
        assert!(extract_rows(body, &selectors()).is_none());
    }

    #[test]
    fn test_record_from_raw_fills_derived_fields() {
        let record = WordRecord::from_raw(
            "jlpt-n5-0001".to_string(),
            5,
            RawWord {
                word: "猫".to_string(),
                reading: "ねこ".to_string(),
                meaning: "cat".to_string(),
            },
        );

        assert_eq!(record.level, "N5");
        assert_eq!(record.tags, "jlpt-n5");
        assert_eq!(record.difficulty, 5);
        assert_eq!(record.romaji, "");
        assert_eq!(record.example_jp, "");
        assert_eq!(record.example_en, "");
    }
}
