//! Card content for an exported item.
//!
//! Everything here is pure: the same item always renders the same card.

use crate::item::ScrapedItem;

const TITLE_MAX_CHARS: usize = 100;
const TITLE_KEEP_CHARS: usize = 97;
const FOOTER: &str = "*Added via Twitter to Trello Extension*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub title: String,
    pub description: String,
}

pub fn format_item(item: &ScrapedItem) -> CardContent {
    CardContent {
        title: card_title(&item.text),
        description: card_description(item),
    }
}

/// Text verbatim up to 100 chars, otherwise the first 97 plus "...".
pub fn card_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = text.chars().take(TITLE_KEEP_CHARS).collect();
        title.push_str("...");
        title
    } else {
        text.to_string()
    }
}

fn card_description(item: &ScrapedItem) -> String {
    let mut desc = format!("**Tweet by {}**\n\n", item.author);
    desc.push_str(&format!("{}\n\n", item.text));

    if !item.url.is_empty() {
        desc.push_str(&format!("**Original Tweet:** {}\n\n", item.url));
    }

    if !item.timestamp.is_empty() {
        desc.push_str(&format!("**Posted:** {}\n\n", posted_time(&item.timestamp)));
    }

    if !item.images.is_empty() {
        desc.push_str("**Media:**\n");
        for img in &item.images {
            desc.push_str(&format!("- {}\n", img));
        }
    }

    desc.push('\n');
    desc.push_str(FOOTER);
    desc
}

/// Render an RFC 3339 timestamp in UTC; anything unparseable is shown as-is.
fn posted_time(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&chrono::Utc)
                .format("%b %-d, %Y %H:%M UTC")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

/// Profile pictures make poor card covers.
pub fn is_profile_image(url: &str) -> bool {
    url.contains("profile_images")
}

/// Attachment name: last path segment of the URL, or "Media N".
pub fn attachment_name(url: &str, index: usize) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    match path.split_once('/') {
        Some((_, tail)) => match tail.rsplit('/').next() {
            Some(segment) if !segment.is_empty() => segment.to_string(),
            _ => format!("Media {}", index + 1),
        },
        None => format!("Media {}", index + 1),
    }
}
