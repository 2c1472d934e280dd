//! Group ("grupo") endpoints.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{Group, MembershipChange, NewGroup};

#[async_trait]
pub trait GroupApi: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<Group>, ApiError>;
    async fn get_group(&self, id: u64) -> Result<Group, ApiError>;
    async fn create_group(&self, group: &NewGroup) -> Result<Group, ApiError>;
    async fn change_members(&self, id: u64, change: &MembershipChange)
        -> Result<Group, ApiError>;
}

impl ApiClient {
    pub async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        let builder = self.http.get(self.endpoint("api/grupos"));
        self.send(builder, true, "list groups").await
    }

    pub async fn get_group(&self, id: u64) -> Result<Group, ApiError> {
        let builder = self.http.get(self.endpoint(&format!("api/grupos/{}", id)));
        self.send(builder, true, "fetch group").await
    }

    pub async fn create_group(&self, group: &NewGroup) -> Result<Group, ApiError> {
        let builder = self.http.post(self.endpoint("api/grupos")).json(group);
        self.send(builder, true, "create group").await
    }

    pub async fn change_members(
        &self,
        id: u64,
        change: &MembershipChange,
    ) -> Result<Group, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/grupos/{}/membros", id)))
            .json(change);
        self.send(builder, true, "change group members").await
    }
}

#[async_trait]
impl GroupApi for ApiClient {
    async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        ApiClient::list_groups(self).await
    }

    async fn get_group(&self, id: u64) -> Result<Group, ApiError> {
        ApiClient::get_group(self, id).await
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, ApiError> {
        ApiClient::create_group(self, group).await
    }

    async fn change_members(
        &self,
        id: u64,
        change: &MembershipChange,
    ) -> Result<Group, ApiError> {
        ApiClient::change_members(self, id, change).await
    }
}
