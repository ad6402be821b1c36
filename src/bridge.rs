//! Request/response messages between the selection surface and the broker
//! that owns the credentials.
//!
//! Every request gets exactly one response. The broker runs as a single
//! tokio task and handles requests one at a time.

use crate::error::{ConnectivityError, ExportError};
use crate::item::{BatchSummary, ScrapedItem};
use crate::pipeline::ExportPipeline;
use crate::store::{ExportConfig, SettingsStore};
use crate::trello::types::{Board, BoardList};
use crate::trello::BoardApi;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const NOT_CONFIGURED: &str = "Please configure your Trello API credentials first.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum BridgeRequest {
    #[serde(rename = "exportToTrello")]
    ExportToTrello { tweets: Vec<ScrapedItem> },
    #[serde(rename = "configureApi")]
    ConfigureApi { config: ApiConfigPayload },
    #[serde(rename = "getBoards")]
    GetBoards,
    #[serde(rename = "getLists")]
    GetLists {
        #[serde(rename = "boardId")]
        board_id: String,
    },
    #[serde(rename = "getExportedTweets")]
    GetExportedTweets,
}

/// Credential bundle as sent by the configuration surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfigPayload {
    pub api_key: String,
    pub token: String,
    pub board_id: String,
    pub todo_list_id: String,
}

impl From<ApiConfigPayload> for ExportConfig {
    fn from(p: ApiConfigPayload) -> Self {
        ExportConfig {
            api_key: p.api_key.trim().to_string(),
            api_token: p.token.trim().to_string(),
            board_id: p.board_id.trim().to_string(),
            list_id: p.todo_list_id.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boards: Option<Vec<Board>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<BoardList>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_tweets: Option<Vec<String>>,
}

impl BridgeResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// User-facing response for a finished batch.
pub fn summary_response(summary: &BatchSummary) -> BridgeResponse {
    let ok = summary.succeeded();
    let failed = summary.failed();
    let skipped = summary.skipped_count();

    if summary.all_skipped() {
        return BridgeResponse::ok_message(format!(
            "All {} tweets were already exported.",
            skipped
        ));
    }
    if failed > 0 {
        return BridgeResponse::failure(format!(
            "Exported {} tweets, but {} failed.",
            ok, failed
        ));
    }
    let mut message = format!("Successfully exported {} tweets to Trello!", ok);
    if skipped > 0 {
        message.push_str(&format!(" ({} already exported, skipped)", skipped));
    }
    BridgeResponse::ok_message(message)
}

/// Owns the API client, the store and the export pipeline.
pub struct Broker {
    api: Arc<dyn BoardApi>,
    store: Arc<dyn SettingsStore>,
    pipeline: ExportPipeline,
}

impl Broker {
    pub fn new(api: Arc<dyn BoardApi>, store: Arc<dyn SettingsStore>, pipeline: ExportPipeline) -> Self {
        Self { api, store, pipeline }
    }

    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        match request {
            BridgeRequest::ExportToTrello { tweets } => self.handle_export(tweets).await,
            BridgeRequest::ConfigureApi { config } => self.handle_configure(config),
            BridgeRequest::GetBoards => self.handle_get_boards().await,
            BridgeRequest::GetLists { board_id } => self.handle_get_lists(&board_id).await,
            BridgeRequest::GetExportedTweets => match self.store.history() {
                Ok(history) => BridgeResponse {
                    exported_tweets: Some(history.into_iter().collect()),
                    ..BridgeResponse::ok()
                },
                Err(e) => BridgeResponse::failure(e.to_string()),
            },
        }
    }

    async fn handle_export(&self, tweets: Vec<ScrapedItem>) -> BridgeResponse {
        match self.pipeline.export(tweets).await {
            Ok(summary) => summary_response(&summary),
            Err(ExportError::Config) => BridgeResponse::failure(NOT_CONFIGURED),
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                BridgeResponse::failure(e.to_string())
            }
        }
    }

    fn handle_configure(&self, payload: ApiConfigPayload) -> BridgeResponse {
        match self.store.save_config(payload.into()) {
            Ok(()) => {
                tracing::info!("API configuration saved");
                BridgeResponse::ok()
            }
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }

    async fn handle_get_boards(&self) -> BridgeResponse {
        let creds = match self.store.config() {
            Ok(config) => config.credentials(),
            Err(e) => return BridgeResponse::failure(e.to_string()),
        };
        if !creds.is_complete() {
            return BridgeResponse::failure(NOT_CONFIGURED);
        }
        match self.api.get_boards(&creds).await {
            Ok(boards) => BridgeResponse {
                boards: Some(boards),
                ..BridgeResponse::ok()
            },
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }

    async fn handle_get_lists(&self, board_id: &str) -> BridgeResponse {
        let creds = match self.store.config() {
            Ok(config) => config.credentials(),
            Err(e) => return BridgeResponse::failure(e.to_string()),
        };
        if !creds.is_complete() {
            return BridgeResponse::failure(NOT_CONFIGURED);
        }
        match self.api.get_lists(&creds, board_id).await {
            Ok(lists) => BridgeResponse {
                lists: Some(lists),
                ..BridgeResponse::ok()
            },
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }
}

type Envelope = (BridgeRequest, oneshot::Sender<BridgeResponse>);

/// Sending half of the bridge, cheap to clone.
#[derive(Clone)]
pub struct BridgeClient {
    tx: mpsc::Sender<Envelope>,
}

impl BridgeClient {
    /// Send a request and wait for its single response.
    pub async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, ConnectivityError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| ConnectivityError)?;
        reply_rx.await.map_err(|_| ConnectivityError)
    }
}

/// Start the broker task. It stops once every `BridgeClient` is dropped.
pub fn spawn_broker(broker: Broker) -> (BridgeClient, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(16);
    let handle = tokio::spawn(async move {
        while let Some((request, reply)) = rx.recv().await {
            let response = broker.handle(request).await;
            if reply.send(response).is_err() {
                tracing::warn!("requester went away before the response was ready");
            }
        }
        tracing::debug!("broker stopped");
    });
    (BridgeClient { tx }, handle)
}
