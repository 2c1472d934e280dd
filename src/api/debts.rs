//! Peer-to-peer debt ("dívida") endpoints.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{Debt, DebtFilter, DebtPatch, NewDebt, PaymentRequest, UserBalance};

/// Debt endpoints, including the server-computed net balance.
#[async_trait]
pub trait DebtApi: Send + Sync {
    async fn list_debts(&self, filter: &DebtFilter) -> Result<Vec<Debt>, ApiError>;
    async fn create_debt(&self, debt: &NewDebt) -> Result<Debt, ApiError>;
    async fn update_debt(&self, id: u64, patch: &DebtPatch) -> Result<Debt, ApiError>;
    async fn delete_debt(&self, id: u64) -> Result<(), ApiError>;
    async fn mark_debt_paid(&self, id: u64, payment: &PaymentRequest) -> Result<Debt, ApiError>;
    async fn reopen_debt(&self, id: u64) -> Result<Debt, ApiError>;
    async fn balance(&self, user_id: u64) -> Result<UserBalance, ApiError>;
}

impl ApiClient {
    pub async fn list_debts(&self, filter: &DebtFilter) -> Result<Vec<Debt>, ApiError> {
        let builder = self
            .http
            .get(self.endpoint("api/dividas"))
            .query(&filter.query());
        self.send(builder, true, "list debts").await
    }

    pub async fn create_debt(&self, debt: &NewDebt) -> Result<Debt, ApiError> {
        let builder = self.http.post(self.endpoint("api/dividas")).json(debt);
        self.send(builder, true, "create debt").await
    }

    pub async fn update_debt(&self, id: u64, patch: &DebtPatch) -> Result<Debt, ApiError> {
        let builder = self
            .http
            .put(self.endpoint(&format!("api/dividas/{}", id)))
            .json(patch);
        self.send(builder, true, "update debt").await
    }

    pub async fn delete_debt(&self, id: u64) -> Result<(), ApiError> {
        let builder = self
            .http
            .delete(self.endpoint(&format!("api/dividas/{}", id)));
        self.send_no_content(builder, true, "delete debt").await
    }

    pub async fn mark_debt_paid(
        &self,
        id: u64,
        payment: &PaymentRequest,
    ) -> Result<Debt, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/dividas/{}/pagar", id)))
            .json(payment);
        self.send(builder, true, "mark debt paid").await
    }

    pub async fn reopen_debt(&self, id: u64) -> Result<Debt, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/dividas/{}/reabrir", id)));
        self.send(builder, true, "reopen debt").await
    }

    pub async fn balance(&self, user_id: u64) -> Result<UserBalance, ApiError> {
        let builder = self
            .http
            .get(self.endpoint(&format!("api/dividas/saldo/{}", user_id)));
        self.send(builder, true, "fetch balance").await
    }
}

#[async_trait]
impl DebtApi for ApiClient {
    async fn list_debts(&self, filter: &DebtFilter) -> Result<Vec<Debt>, ApiError> {
        ApiClient::list_debts(self, filter).await
    }

    async fn create_debt(&self, debt: &NewDebt) -> Result<Debt, ApiError> {
        ApiClient::create_debt(self, debt).await
    }

    async fn update_debt(&self, id: u64, patch: &DebtPatch) -> Result<Debt, ApiError> {
        ApiClient::update_debt(self, id, patch).await
    }

    async fn delete_debt(&self, id: u64) -> Result<(), ApiError> {
        ApiClient::delete_debt(self, id).await
    }

    async fn mark_debt_paid(&self, id: u64, payment: &PaymentRequest) -> Result<Debt, ApiError> {
        ApiClient::mark_debt_paid(self, id, payment).await
    }

    async fn reopen_debt(&self, id: u64) -> Result<Debt, ApiError> {
        ApiClient::reopen_debt(self, id).await
    }

    async fn balance(&self, user_id: u64) -> Result<UserBalance, ApiError> {
        ApiClient::balance(self, user_id).await
    }
}
