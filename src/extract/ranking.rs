//! Ranking listing extraction

use crate::config::RankingSelectors;
use scraper::{Html, Selector};

/// One artwork entry from the ranking listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// External id from the listing markup
    pub id: String,
    pub title: String,
    pub author: String,
    pub thumbnail: Option<String>,
    /// Detail page holding the original-resource reference
    pub detail_url: String,
}

/// Per-item extraction outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Extracted(MediaItem),
    Skipped { index: usize, reason: String },
}

/// Extracts media items from a ranking listing page.
///
/// An item without an id cannot be resolved to a detail page and is skipped.
/// Missing titles and authors get placeholder values; the item is still
/// downloadable.
pub fn extract_ranking(
    body: &str,
    selectors: &RankingSelectors,
    detail_url_template: &str,
) -> Vec<ItemOutcome> {
    let document = Html::parse_document(body);

    let item_sel = match Selector::parse(&selectors.item) {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };
    let title_sel = Selector::parse(&selectors.title).ok();
    let author_sel = Selector::parse(&selectors.author).ok();
    let thumb_sel = Selector::parse(&selectors.thumbnail).ok();

    let mut outcomes = Vec::new();
    for (index, item) in document.select(&item_sel).enumerate() {
        let id = match item.value().attr(&selectors.id_attr) {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                outcomes.push(ItemOutcome::Skipped {
                    index: index + 1,
                    reason: format!("missing {} attribute", selectors.id_attr),
                });
                continue;
            }
        };

        let title = title_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("untitled-{}", id));

        let author = author_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let thumbnail = thumb_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .and_then(|el| el.value().attr("src"))
            .map(str::to_string);

        outcomes.push(ItemOutcome::Extracted(MediaItem {
            detail_url: detail_url_template.replace("{id}", &id),
            id,
            title,
            author,
            thumbnail,
        }));
    }

    outcomes
}
