//! Multi-select state for the feed page.
//!
//! Selection order is kept as `(key, order)` pairs keyed by the post's
//! stable key, so a page that reorders or grows never shifts which posts
//! are selected.

use crate::bridge::BridgeResponse;
use crate::error::ConnectivityError;
use crate::feed::{FeedPage, ItemKey};
use crate::item::ScrapedItem;
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::watch;

pub const RELOAD_NOTICE: &str = "Extension was reloaded. Please refresh this page and try again.";
pub const NOTHING_TO_EXPORT_NOTICE: &str = "No tweets selected or unable to extract tweet data. \
     The page may have changed - please try selecting tweets again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub key: ItemKey,
    pub order: u32,
}

/// Ordered selection. Orders are always dense, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    entries: Vec<SelectionEntry>,
}

impl SelectionSet {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn order_of(&self, key: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.order)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Select or deselect. Returns true if the key is selected afterwards.
    pub fn toggle(&mut self, key: &str) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(pos);
            self.renumber();
            false
        } else {
            let order = self.entries.len() as u32 + 1;
            self.entries.push(SelectionEntry {
                key: key.to_string(),
                order,
            });
            true
        }
    }

    fn renumber(&mut self) {
        self.entries.sort_by_key(|e| e.order);
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.order = i as u32 + 1;
        }
    }

    /// Entries in selection order.
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("selection mode is not active")]
    Inactive,
    #[error("an export is already in progress")]
    ExportInFlight,
    #[error("{}", NOTHING_TO_EXPORT_NOTICE)]
    NothingToExport,
}

/// What the user should be told once an export round trip finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNotice {
    pub success: bool,
    pub message: String,
}

#[derive(Default)]
pub struct SelectionSession {
    active: bool,
    exporting: bool,
    epoch: u64,
    selected: SelectionSet,
    bound: HashSet<ItemKey>,
    changes: Option<watch::Receiver<u64>>,
}

impl SelectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Bumped on every entry into selection mode.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn toggle_mode(&mut self, page: &dyn FeedPage) {
        if self.active {
            self.exit();
        } else {
            self.enter(page);
        }
    }

    pub fn enter(&mut self, page: &dyn FeedPage) {
        if self.active {
            return;
        }
        self.active = true;
        self.epoch += 1;
        let mut rx = page.subscribe();
        rx.mark_unchanged();
        self.changes = Some(rx);
        let bound = self.rebind(page);
        tracing::info!(bound, "selection mode entered");
    }

    /// Leave selection mode, dropping all selection state and the page
    /// subscription.
    pub fn exit(&mut self) {
        self.active = false;
        self.exporting = false;
        self.selected.clear();
        self.bound.clear();
        self.changes = None;
        tracing::info!("selection mode exited");
    }

    /// Bind every post on the page not bound yet. Returns how many were new.
    pub fn rebind(&mut self, page: &dyn FeedPage) -> usize {
        if !self.active {
            return 0;
        }
        let mut added = 0;
        for key in page.item_keys() {
            if self.bound.insert(key) {
                added += 1;
            }
        }
        added
    }

    /// Rescan the page if it announced a structural change since last time.
    pub fn poll_structural_changes(&mut self, page: &dyn FeedPage) -> usize {
        let changed = match self.changes.as_mut() {
            Some(rx) => match rx.has_changed() {
                Ok(true) => {
                    rx.mark_unchanged();
                    true
                }
                _ => false,
            },
            None => false,
        };
        if !changed {
            return 0;
        }
        let added = self.rebind(page);
        if added > 0 {
            tracing::debug!(added, "page changed, bound new posts");
        }
        added
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.bound.contains(key)
    }

    /// Toggle one post. Ignored while inactive or for posts never bound.
    pub fn toggle_item(&mut self, key: &str) -> Option<bool> {
        if !self.active || !self.bound.contains(key) {
            return None;
        }
        Some(self.selected.toggle(key))
    }

    pub fn order_of(&self, key: &str) -> Option<u32> {
        self.selected.order_of(key)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn can_export(&self) -> bool {
        self.active && !self.exporting && !self.selected.is_empty()
    }

    pub fn counter_label(&self) -> String {
        match self.selected.len() {
            0 => "No tweets selected".to_string(),
            1 => "1 tweet selected".to_string(),
            n => format!("{} tweets selected", n),
        }
    }

    pub fn export_label(&self) -> String {
        let n = self.selected.len();
        if self.exporting {
            "Exporting...".to_string()
        } else if n > 0 {
            format!("Export {} Tweet{} to Trello", n, if n > 1 { "s" } else { "" })
        } else {
            "Export to Trello".to_string()
        }
    }

    /// Collect the batch and mark an export in flight. Posts that left the
    /// page or fail extraction are dropped.
    pub fn begin_export(&mut self, page: &dyn FeedPage) -> Result<Vec<ScrapedItem>, SelectionError> {
        if !self.active {
            return Err(SelectionError::Inactive);
        }
        if self.exporting {
            return Err(SelectionError::ExportInFlight);
        }
        self.exporting = true;

        let mut items = Vec::with_capacity(self.selected.len());
        for entry in self.selected.entries() {
            if !page.contains(&entry.key) {
                tracing::warn!(key = %entry.key, "selected post no longer on the page, skipping");
                continue;
            }
            match page.extract(&entry.key) {
                Ok(mut item) => {
                    item.selection_order = Some(entry.order);
                    items.push(item);
                }
                Err(e) => tracing::warn!(error = %e, "dropping post from export"),
            }
        }

        if items.is_empty() {
            self.exporting = false;
            return Err(SelectionError::NothingToExport);
        }

        items.sort_by_key(|i| i.selection_order);
        tracing::info!(count = items.len(), "exporting selected posts");
        Ok(items)
    }

    /// Clear the in-flight flag and turn the broker's answer into a notice.
    /// A successful export leaves selection mode.
    pub fn finish_export(
        &mut self,
        exported: usize,
        outcome: Result<BridgeResponse, ConnectivityError>,
    ) -> ExportNotice {
        self.exporting = false;
        let notice = export_notice(exported, outcome);
        if notice.success {
            self.exit();
        }
        notice
    }
}

/// User-facing notice for a finished export round trip.
pub fn export_notice(
    exported: usize,
    outcome: Result<BridgeResponse, ConnectivityError>,
) -> ExportNotice {
    match outcome {
        Err(ConnectivityError) => {
            tracing::error!("export service unreachable");
            ExportNotice {
                success: false,
                message: RELOAD_NOTICE.to_string(),
            }
        }
        Ok(resp) if resp.success => ExportNotice {
            success: true,
            message: resp
                .message
                .unwrap_or_else(|| format!("Successfully exported {} tweets to Trello!", exported)),
        },
        Ok(resp) => ExportNotice {
            success: false,
            message: format!(
                "Error exporting tweets: {}",
                resp.error.unwrap_or_else(|| "Unknown error".to_string())
            ),
        },
    }
}
