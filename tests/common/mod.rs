//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use trello_export::config::ExportPacingConfig;
use trello_export::error::RemoteError;
use trello_export::item::ScrapedItem;
use trello_export::pipeline::ExportPipeline;
use trello_export::store::{ApiCredentials, ExportConfig, MemoryStore, SettingsStore, StoredState};
use trello_export::trello::types::{Board, BoardList};
use trello_export::trello::BoardApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetBoards,
    GetLists(String),
    CreateCard { name: String, list_id: String },
    Attach { card_id: String, url: String, name: String },
    SetCover { card_id: String, attachment_id: String },
}

/// Records every call. Card creation fails for names listed in
/// `fail_cards`, attachment fails for URLs listed in `fail_attachments`.
/// With a watched store, each `create_card` also snapshots the store's
/// history as it was when the call arrived.
#[derive(Default)]
pub struct FakeBoardApi {
    pub calls: Mutex<Vec<Call>>,
    pub fail_cards: HashSet<String>,
    pub fail_attachments: HashSet<String>,
    watched: Option<Arc<MemoryStore>>,
    history_at_create: Mutex<Vec<BTreeSet<String>>>,
    next_id: Mutex<u32>,
}

impl FakeBoardApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_card(mut self, name: &str) -> Self {
        self.fail_cards.insert(name.to_string());
        self
    }

    pub fn failing_attachment(mut self, url: &str) -> Self {
        self.fail_attachments.insert(url.to_string());
        self
    }

    pub fn watching(mut self, store: &Arc<MemoryStore>) -> Self {
        self.watched = Some(store.clone());
        self
    }

    pub fn history_at_create(&self) -> Vec<BTreeSet<String>> {
        self.history_at_create.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn card_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateCard { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    fn next(&self, prefix: &str) -> String {
        let mut n = self.next_id.lock().unwrap();
        *n += 1;
        format!("{}{}", prefix, *n)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BoardApi for FakeBoardApi {
    async fn get_boards(&self, _creds: &ApiCredentials) -> Result<Vec<Board>, RemoteError> {
        self.record(Call::GetBoards);
        Ok(vec![Board {
            id: "b1".to_string(),
            name: "Reading".to_string(),
            closed: false,
            url: None,
        }])
    }

    async fn get_lists(
        &self,
        _creds: &ApiCredentials,
        board_id: &str,
    ) -> Result<Vec<BoardList>, RemoteError> {
        self.record(Call::GetLists(board_id.to_string()));
        Ok(vec![BoardList {
            id: "l1".to_string(),
            name: "To Do".to_string(),
            closed: false,
        }])
    }

    async fn create_card(
        &self,
        _creds: &ApiCredentials,
        name: &str,
        _desc: &str,
        list_id: &str,
    ) -> Result<String, RemoteError> {
        self.record(Call::CreateCard {
            name: name.to_string(),
            list_id: list_id.to_string(),
        });
        if let Some(store) = &self.watched {
            let history = store.history().unwrap();
            self.history_at_create.lock().unwrap().push(history);
        }
        if self.fail_cards.contains(name) {
            return Err(RemoteError::http(400, "invalid value for idList"));
        }
        Ok(self.next("card-"))
    }

    async fn attach_media(
        &self,
        _creds: &ApiCredentials,
        card_id: &str,
        url: &str,
        name: &str,
    ) -> Result<String, RemoteError> {
        self.record(Call::Attach {
            card_id: card_id.to_string(),
            url: url.to_string(),
            name: name.to_string(),
        });
        if self.fail_attachments.contains(url) {
            return Err(RemoteError::transport("connection reset"));
        }
        Ok(self.next("att-"))
    }

    async fn set_card_cover(
        &self,
        _creds: &ApiCredentials,
        card_id: &str,
        attachment_id: &str,
    ) -> Result<(), RemoteError> {
        self.record(Call::SetCover {
            card_id: card_id.to_string(),
            attachment_id: attachment_id.to_string(),
        });
        Ok(())
    }
}

pub fn configured() -> ExportConfig {
    ExportConfig {
        api_key: "key".to_string(),
        api_token: "token".to_string(),
        board_id: "b1".to_string(),
        list_id: "l1".to_string(),
    }
}

pub fn store_with(config: ExportConfig, history: &[&str]) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(StoredState {
        config,
        exported: history.iter().map(|s| s.to_string()).collect(),
    }))
}

pub fn pipeline(api: &Arc<FakeBoardApi>, store: &Arc<MemoryStore>) -> ExportPipeline {
    ExportPipeline::new(api.clone(), store.clone(), ExportPacingConfig::none())
}

pub fn item(text: &str, url: &str) -> ScrapedItem {
    ScrapedItem {
        text: text.to_string(),
        author: "Jane @jane".to_string(),
        timestamp: "2024-05-01T10:00:00.000Z".to_string(),
        url: url.to_string(),
        images: vec![],
        selection_order: None,
    }
}
