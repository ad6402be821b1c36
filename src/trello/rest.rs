use super::auth;
use super::types::*;
use super::BoardApi;
use crate::error::RemoteError;
use crate::store::ApiCredentials;
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub struct TrelloRest {
    client: Client,
    base_url: Url,
}

impl TrelloRest {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::transport(format!("failed to build HTTP client: {}", e)))?;
        let base_url = Url::parse(base_url)
            .map_err(|e| RemoteError::transport(format!("invalid API base '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::transport(format!("invalid API base '{}'", base_url)));
        }
        Ok(Self { client, base_url })
    }

    /// Base URL plus path segments. Each segment is percent-encoded, so ids
    /// containing `/` or `?` stay inside their segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// One authenticated request. Non-2xx responses become `RemoteError`
    /// carrying the status and body text.
    async fn call<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        creds: &ApiCredentials,
        body: Option<&B>,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        let mut req = self
            .client
            .request(method.clone(), url)
            .query(&auth::query_params(creds));
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::error!(%method, path = %path, auth = %auth::redacted(creds), error = %e, "Trello request failed");
            RemoteError::transport(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(%method, path = %path, status = status.as_u16(), body = %body, "Trello API error");
            return Err(RemoteError::http(status.as_u16(), body));
        }

        resp.json().await.map_err(|e| {
            RemoteError::transport(format!("failed to parse {} {} response: {}", method, path, e))
        })
    }
}

#[async_trait]
impl BoardApi for TrelloRest {
    async fn get_boards(&self, creds: &ApiCredentials) -> Result<Vec<Board>, RemoteError> {
        self.call::<(), _>(Method::GET, &["members", "me", "boards"], creds, None)
            .await
    }

    async fn get_lists(
        &self,
        creds: &ApiCredentials,
        board_id: &str,
    ) -> Result<Vec<BoardList>, RemoteError> {
        self.call::<(), _>(Method::GET, &["boards", board_id, "lists"], creds, None)
            .await
    }

    async fn create_card(
        &self,
        creds: &ApiCredentials,
        name: &str,
        desc: &str,
        list_id: &str,
    ) -> Result<String, RemoteError> {
        let body = CreateCardRequest {
            name,
            desc,
            id_list: list_id,
        };
        let card: Card = self.call(Method::POST, &["cards"], creds, Some(&body)).await?;
        Ok(card.id)
    }

    async fn attach_media(
        &self,
        creds: &ApiCredentials,
        card_id: &str,
        url: &str,
        name: &str,
    ) -> Result<String, RemoteError> {
        let body = AttachmentRequest { url, name };
        let attachment: Attachment = self
            .call(Method::POST, &["cards", card_id, "attachments"], creds, Some(&body))
            .await?;
        Ok(attachment.id)
    }

    async fn set_card_cover(
        &self,
        creds: &ApiCredentials,
        card_id: &str,
        attachment_id: &str,
    ) -> Result<(), RemoteError> {
        let body = CoverRequest {
            id_attachment_cover: attachment_id,
        };
        // Response is the updated card; only success matters here.
        let _: serde_json::Value = self.call(Method::PUT, &["cards", card_id], creds, Some(&body)).await?;
        Ok(())
    }
}
