use serde::{Deserialize, Serialize};

/// One post scraped from a feed page.
///
/// Field names follow the bridge message format, so a batch can be read
/// straight from an `exportToTrello` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub text: String,
    pub author: String,
    /// ISO-8601 post time, empty when unknown.
    #[serde(default)]
    pub timestamp: String,
    /// Link to the original post. Empty means unknown and is never deduped.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(
        default,
        rename = "selectionOrder",
        skip_serializing_if = "Option::is_none"
    )]
    pub selection_order: Option<u32>,
}

impl ScrapedItem {
    /// Dedup identity, if the item has one.
    pub fn source_url(&self) -> Option<&str> {
        if self.url.is_empty() {
            None
        } else {
            Some(&self.url)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportResult {
    Success { card_id: String },
    Failure { message: String },
}

#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub item: ScrapedItem,
    pub result: ExportResult,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, ExportResult::Success { .. })
    }
}

/// Result of one `export` call. Outcomes keep batch order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ItemOutcome>,
    pub skipped: Vec<ScrapedItem>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when every submitted item was already exported.
    pub fn all_skipped(&self) -> bool {
        self.outcomes.is_empty() && !self.skipped.is_empty()
    }
}
