//! The feed page the selection surface works on.
//!
//! A page is a list of post entries identified by stable keys. Structural
//! changes (new posts loaded, page reloaded) are announced through a watch
//! channel carrying a generation counter.

use crate::error::ExtractionError;
use crate::item::ScrapedItem;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::sync::watch;

const MISSING_TEXT: &str = "Tweet content not found";
const MISSING_AUTHOR: &str = "Unknown author";

/// Stable identity of one post on a page. Never a list position.
pub type ItemKey = String;

pub trait FeedPage {
    /// Keys of the posts currently on the page, in page order.
    fn item_keys(&self) -> Vec<ItemKey>;
    fn contains(&self, key: &str) -> bool;
    fn extract(&self, key: &str) -> Result<ScrapedItem, ExtractionError>;
    /// Structural-change notifications. The value is a generation counter.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// One post as it appears on the page. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    pub key: ItemKey,
    /// `None` when the entry has no post body at all (ad slot, placeholder).
    #[serde(default)]
    pub post: Option<PostBody>,
}

pub struct FeedDocument {
    entries: Vec<FeedEntry>,
    link_base: String,
    generation: watch::Sender<u64>,
}

impl FeedDocument {
    pub fn new(entries: Vec<FeedEntry>, link_base: &str) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            entries,
            link_base: link_base.trim_end_matches('/').to_string(),
            generation,
        }
    }

    pub fn load(path: &Path, link_base: &str) -> Result<Self> {
        Ok(Self::new(read_entries(path)?, link_base))
    }

    /// Re-read the feed file and announce the change.
    pub fn reload(&mut self, path: &Path) -> Result<usize> {
        let entries = read_entries(path)?;
        let count = entries.len();
        self.replace(entries);
        Ok(count)
    }

    /// Swap the page content, as when infinite scroll loads new posts.
    pub fn replace(&mut self, entries: Vec<FeedEntry>) {
        self.entries = entries;
        self.generation.send_modify(|g| *g += 1);
        tracing::debug!(entries = self.entries.len(), "feed page changed");
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    fn entry(&self, key: &str) -> Option<&FeedEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    fn absolute_link(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.link_base, href)
        } else {
            format!("{}/{}", self.link_base, href)
        }
    }
}

fn read_entries(path: &Path) -> Result<Vec<FeedEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse feed file: {}", path.display()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl FeedPage for FeedDocument {
    fn item_keys(&self) -> Vec<ItemKey> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    fn extract(&self, key: &str) -> Result<ScrapedItem, ExtractionError> {
        let entry = self.entry(key).ok_or_else(|| ExtractionError {
            key: key.to_string(),
            reason: "no longer on the page".to_string(),
        })?;
        let post = entry.post.as_ref().ok_or_else(|| ExtractionError {
            key: key.to_string(),
            reason: "entry has no post body".to_string(),
        })?;

        Ok(ScrapedItem {
            text: non_empty(&post.text).unwrap_or(MISSING_TEXT).to_string(),
            author: non_empty(&post.author).unwrap_or(MISSING_AUTHOR).to_string(),
            timestamp: non_empty(&post.time).unwrap_or_default().to_string(),
            url: non_empty(&post.href)
                .map(|href| self.absolute_link(href))
                .unwrap_or_default(),
            images: post
                .images
                .iter()
                .filter(|src| src.contains("media"))
                .cloned()
                .collect(),
            selection_order: None,
        })
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}
