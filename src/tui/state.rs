use crate::bridge::BridgeResponse;
use crate::error::ConnectivityError;
use crate::feed::{FeedDocument, FeedPage};
use crate::selection::{ExportNotice, SelectionSession};
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Export round trip running in the background while the UI keeps drawing.
pub struct PendingExport {
    pub count: usize,
    /// Session epoch the export was started from.
    pub epoch: u64,
    pub handle: JoinHandle<Result<BridgeResponse, ConnectivityError>>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

pub struct AppState {
    pub feed_path: PathBuf,
    pub page: FeedDocument,
    pub session: SelectionSession,
    pub cursor: usize,
    pub notice: Option<ExportNotice>,
    pub pending: Option<PendingExport>,
    pub logs: VecDeque<LogEntry>,
}

impl AppState {
    pub fn new(feed_path: PathBuf, page: FeedDocument) -> Self {
        Self {
            feed_path,
            page,
            session: SelectionSession::new(),
            cursor: 0,
            notice: None,
            pending: None,
            logs: VecDeque::with_capacity(50),
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        if self.logs.len() >= 50 {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    /// One export at a time, even across leaving and re-entering
    /// selection mode.
    pub fn can_export(&self) -> bool {
        self.pending.is_none() && self.session.can_export()
    }

    pub fn export_label(&self) -> String {
        if self.pending.is_some() {
            "Exporting...".to_string()
        } else {
            self.session.export_label()
        }
    }

    pub fn item_count(&self) -> usize {
        self.page.entries().len()
    }

    pub fn cursor_key(&self) -> Option<String> {
        self.page.entries().get(self.cursor).map(|e| e.key.clone())
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.item_count();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn toggle_mode(&mut self) {
        self.session.toggle_mode(&self.page);
        let mode = if self.session.is_active() { "entered" } else { "left" };
        self.push_log("INFO", format!("selection mode {}", mode));
    }

    pub fn reload_feed(&mut self) {
        match self.page.reload(&self.feed_path) {
            Ok(n) => {
                self.push_log("INFO", format!("feed reloaded ({} posts)", n));
                self.move_cursor(0);
            }
            Err(e) => self.push_log("ERROR", format!("{:#}", e)),
        }
    }

    /// Pick up posts that appeared since the last frame.
    pub fn poll_page(&mut self) {
        let added = self.session.poll_structural_changes(&self.page);
        if added > 0 {
            self.push_log("INFO", format!("{} new posts selectable", added));
        }
    }

    pub fn label_for(&self, key: &str) -> String {
        match self.session.order_of(key) {
            Some(n) => format!("[{:>2}]", n),
            None if self.session.is_bound(key) => "[  ]".to_string(),
            None => "    ".to_string(),
        }
    }

    pub fn preview(&self, key: &str) -> String {
        match self.page.extract(key) {
            Ok(item) => format!("{}: {}", item.author, item.text.replace('\n', " ")),
            Err(e) => format!("<{}>", e.reason),
        }
    }
}
