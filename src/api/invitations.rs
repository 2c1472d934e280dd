//! Email invitation ("convite") endpoints.
//!
//! The `public/{token}` routes serve the invitation landing page and are
//! unauthenticated, mirroring the payment-link capability model.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{Invitation, NewInvitation};

#[async_trait]
pub trait InvitationApi: Send + Sync {
    async fn list_invitations(&self, expense_id: u64) -> Result<Vec<Invitation>, ApiError>;
    async fn create_invitation(
        &self,
        expense_id: u64,
        invitation: &NewInvitation,
    ) -> Result<Invitation, ApiError>;
    async fn get_invitation(&self, token: &str) -> Result<Invitation, ApiError>;
    async fn accept_invitation(&self, token: &str) -> Result<Invitation, ApiError>;
    async fn reject_invitation(&self, token: &str) -> Result<Invitation, ApiError>;
}

impl ApiClient {
    pub async fn list_invitations(&self, expense_id: u64) -> Result<Vec<Invitation>, ApiError> {
        let builder = self
            .http
            .get(self.endpoint(&format!("api/convites/conta/{}", expense_id)));
        self.send(builder, true, "list invitations").await
    }

    pub async fn create_invitation(
        &self,
        expense_id: u64,
        invitation: &NewInvitation,
    ) -> Result<Invitation, ApiError> {
        let builder = self
            .http
            .post(self.endpoint(&format!("api/convites/conta/{}", expense_id)))
            .json(invitation);
        self.send(builder, true, "create invitation").await
    }

    pub async fn get_invitation(&self, token: &str) -> Result<Invitation, ApiError> {
        let builder = self
            .http
            .get(self.endpoint(&format!("api/convites/public/{}", token)));
        self.send(builder, false, "fetch invitation").await
    }

    pub async fn accept_invitation(&self, token: &str) -> Result<Invitation, ApiError> {
        let builder = self
            .http
            .post(self.endpoint(&format!("api/convites/public/{}/aceitar", token)));
        self.send(builder, false, "accept invitation").await
    }

    pub async fn reject_invitation(&self, token: &str) -> Result<Invitation, ApiError> {
        let builder = self
            .http
            .post(self.endpoint(&format!("api/convites/public/{}/rejeitar", token)));
        self.send(builder, false, "reject invitation").await
    }
}

#[async_trait]
impl InvitationApi for ApiClient {
    async fn list_invitations(&self, expense_id: u64) -> Result<Vec<Invitation>, ApiError> {
        ApiClient::list_invitations(self, expense_id).await
    }

    async fn create_invitation(
        &self,
        expense_id: u64,
        invitation: &NewInvitation,
    ) -> Result<Invitation, ApiError> {
        ApiClient::create_invitation(self, expense_id, invitation).await
    }

    async fn get_invitation(&self, token: &str) -> Result<Invitation, ApiError> {
        ApiClient::get_invitation(self, token).await
    }

    async fn accept_invitation(&self, token: &str) -> Result<Invitation, ApiError> {
        ApiClient::accept_invitation(self, token).await
    }

    async fn reject_invitation(&self, token: &str) -> Result<Invitation, ApiError> {
        ApiClient::reject_invitation(self, token).await
    }
}
