pub mod auth;
pub mod rest;
pub mod types;

use crate::error::RemoteError;
use crate::store::ApiCredentials;
use async_trait::async_trait;
use types::{Board, BoardList};

/// The remote board surface the export pipeline talks to.
///
/// One call is one HTTP request; implementations never retry.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn get_boards(&self, creds: &ApiCredentials) -> Result<Vec<Board>, RemoteError>;

    async fn get_lists(
        &self,
        creds: &ApiCredentials,
        board_id: &str,
    ) -> Result<Vec<BoardList>, RemoteError>;

    /// Returns the new card id.
    async fn create_card(
        &self,
        creds: &ApiCredentials,
        name: &str,
        desc: &str,
        list_id: &str,
    ) -> Result<String, RemoteError>;

    /// Returns the new attachment id.
    async fn attach_media(
        &self,
        creds: &ApiCredentials,
        card_id: &str,
        url: &str,
        name: &str,
    ) -> Result<String, RemoteError>;

    async fn set_card_cover(
        &self,
        creds: &ApiCredentials,
        card_id: &str,
        attachment_id: &str,
    ) -> Result<(), RemoteError>;
}
