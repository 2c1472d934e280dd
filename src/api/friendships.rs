//! Friendship ("amizade") endpoints.

use async_trait::async_trait;
use serde::Serialize;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::Friendship;

#[derive(Debug, Serialize)]
struct FriendRequest {
    #[serde(rename = "convidadoId")]
    addressee_id: u64,
}

#[async_trait]
pub trait FriendshipApi: Send + Sync {
    async fn list_friendships(&self) -> Result<Vec<Friendship>, ApiError>;
    async fn request_friendship(&self, addressee_id: u64) -> Result<Friendship, ApiError>;
    async fn accept_friendship(&self, id: u64) -> Result<Friendship, ApiError>;
    async fn reject_friendship(&self, id: u64) -> Result<Friendship, ApiError>;
    async fn remove_friendship(&self, id: u64) -> Result<(), ApiError>;
}

impl ApiClient {
    pub async fn list_friendships(&self) -> Result<Vec<Friendship>, ApiError> {
        let builder = self.http.get(self.endpoint("api/amizades"));
        self.send(builder, true, "list friendships").await
    }

    pub async fn request_friendship(&self, addressee_id: u64) -> Result<Friendship, ApiError> {
        let builder = self
            .http
            .post(self.endpoint("api/amizades"))
            .json(&FriendRequest { addressee_id });
        self.send(builder, true, "request friendship").await
    }

    pub async fn accept_friendship(&self, id: u64) -> Result<Friendship, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/amizades/{}/aceitar", id)));
        self.send(builder, true, "accept friendship").await
    }

    pub async fn reject_friendship(&self, id: u64) -> Result<Friendship, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/amizades/{}/rejeitar", id)));
        self.send(builder, true, "reject friendship").await
    }

    pub async fn remove_friendship(&self, id: u64) -> Result<(), ApiError> {
        let builder = self
            .http
            .delete(self.endpoint(&format!("api/amizades/{}", id)));
        self.send_no_content(builder, true, "remove friendship").await
    }
}

#[async_trait]
impl FriendshipApi for ApiClient {
    async fn list_friendships(&self) -> Result<Vec<Friendship>, ApiError> {
        ApiClient::list_friendships(self).await
    }

    async fn request_friendship(&self, addressee_id: u64) -> Result<Friendship, ApiError> {
        ApiClient::request_friendship(self, addressee_id).await
    }

    async fn accept_friendship(&self, id: u64) -> Result<Friendship, ApiError> {
        ApiClient::accept_friendship(self, id).await
    }

    async fn reject_friendship(&self, id: u64) -> Result<Friendship, ApiError> {
        ApiClient::reject_friendship(self, id).await
    }

    async fn remove_friendship(&self, id: u64) -> Result<(), ApiError> {
        ApiClient::remove_friendship(self, id).await
    }
}
