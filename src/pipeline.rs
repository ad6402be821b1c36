//! Batch export of scraped items to Trello cards.
//!
//! Items are processed strictly one after another. Each gets exactly one
//! create-card attempt; a failure is recorded against that item and the
//! batch moves on.

use crate::config::ExportPacingConfig;
use crate::error::{ExportError, RemoteError};
use crate::formatter::{attachment_name, format_item, is_profile_image};
use crate::item::{BatchSummary, ExportResult, ItemOutcome, ScrapedItem};
use crate::store::{ApiCredentials, SettingsStore};
use crate::trello::BoardApi;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

pub struct ExportPipeline {
    api: Arc<dyn BoardApi>,
    store: Arc<dyn SettingsStore>,
    pacing: ExportPacingConfig,
}

/// Split a batch into items to export and items already seen, keeping order.
/// A url repeated inside the batch is exported once.
pub fn partition_batch(
    items: Vec<ScrapedItem>,
    history: &BTreeSet<String>,
) -> (Vec<ScrapedItem>, Vec<ScrapedItem>) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut to_export = Vec::new();
    let mut skipped = Vec::new();
    for item in items {
        match item.source_url() {
            Some(url) if history.contains(url) || seen.contains(url) => skipped.push(item),
            Some(url) => {
                seen.insert(url.to_string());
                to_export.push(item);
            }
            None => to_export.push(item),
        }
    }
    (to_export, skipped)
}

impl ExportPipeline {
    pub fn new(
        api: Arc<dyn BoardApi>,
        store: Arc<dyn SettingsStore>,
        pacing: ExportPacingConfig,
    ) -> Self {
        Self { api, store, pacing }
    }

    pub async fn export(&self, items: Vec<ScrapedItem>) -> Result<BatchSummary, ExportError> {
        let config = self.store.config()?;
        if !config.is_configured() {
            return Err(ExportError::Config);
        }
        let creds = config.credentials();

        let history = self.store.history()?;
        let (to_export, skipped) = partition_batch(items, &history);

        if to_export.is_empty() {
            tracing::info!(skipped = skipped.len(), "all items already exported");
            return Ok(BatchSummary {
                outcomes: Vec::new(),
                skipped,
            });
        }

        tracing::info!(
            to_export = to_export.len(),
            skipped = skipped.len(),
            list_id = %config.list_id,
            "starting export batch"
        );

        let mut outcomes = Vec::with_capacity(to_export.len());
        for (i, item) in to_export.into_iter().enumerate() {
            if i > 0 {
                pace(self.pacing.card_delay()).await;
            }
            let result = self.export_one(&creds, &config.list_id, &item).await;
            outcomes.push(ItemOutcome { item, result });
        }

        let summary = BatchSummary { outcomes, skipped };
        tracing::info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            skipped = summary.skipped_count(),
            "export batch finished"
        );
        Ok(summary)
    }

    async fn export_one(
        &self,
        creds: &ApiCredentials,
        list_id: &str,
        item: &ScrapedItem,
    ) -> ExportResult {
        let card = format_item(item);
        let card_id = match self
            .api
            .create_card(creds, &card.title, &card.description, list_id)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(url = %item.url, error = %e, "failed to create card");
                return ExportResult::Failure {
                    message: e.to_string(),
                };
            }
        };
        tracing::info!(card_id = %card_id, url = %item.url, "card created");

        // Record right away so a crash later in the batch keeps dedup state.
        if let Some(url) = item.source_url() {
            if let Err(e) = self.store.record_exported(url) {
                tracing::error!(url, error = %e, "failed to record exported url");
            }
        }

        self.attach_media(creds, &card_id, &item.images).await;

        ExportResult::Success { card_id }
    }

    /// Attach every media URL in order. The first non-profile image becomes
    /// the cover. Failures here never fail the item.
    async fn attach_media(&self, creds: &ApiCredentials, card_id: &str, images: &[String]) {
        let mut cover_set = false;
        for (i, url) in images.iter().enumerate() {
            if i > 0 {
                pace(self.pacing.attachment_delay()).await;
            }
            let name = attachment_name(url, i);
            let attachment_id = match self.api.attach_media(creds, card_id, url, &name).await {
                Ok(id) => id,
                Err(e) => {
                    log_media_failure(card_id, url, &e, "failed to attach media");
                    continue;
                }
            };

            if cover_set || is_profile_image(url) {
                continue;
            }
            match self.api.set_card_cover(creds, card_id, &attachment_id).await {
                Ok(()) => {
                    cover_set = true;
                    tracing::debug!(card_id, attachment_id = %attachment_id, "cover set");
                }
                Err(e) => log_media_failure(card_id, url, &e, "failed to set card cover"),
            }
        }
    }
}

fn log_media_failure(card_id: &str, url: &str, error: &RemoteError, what: &str) {
    tracing::warn!(card_id, url, error = %error, "{}", what);
}

async fn pace(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str) -> ScrapedItem {
        ScrapedItem {
            text: format!("post {}", url),
            author: "a".to_string(),
            timestamp: String::new(),
            url: url.to_string(),
            images: vec![],
            selection_order: None,
        }
    }

    #[test]
    fn test_partition_skips_history_and_keeps_order() {
        let history: BTreeSet<String> = ["u2".to_string()].into_iter().collect();
        let (to_export, skipped) =
            partition_batch(vec![item("u1"), item("u2"), item(""), item("u3")], &history);
        let urls: Vec<_> = to_export.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "", "u3"]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].url, "u2");
    }

    #[test]
    fn test_partition_dedups_within_batch() {
        let (to_export, skipped) =
            partition_batch(vec![item("u1"), item("u1"), item(""), item("")], &BTreeSet::new());
        assert_eq!(to_export.len(), 3);
        assert_eq!(skipped.len(), 1);
    }
}
