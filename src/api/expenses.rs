//! Expense ("conta") and share ("divisão") endpoints.

use async_trait::async_trait;
use serde::Serialize;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{
    Expense, ExpenseFilter, ExpensePatch, ExpenseStatus, NewExpense, NewShare, PaymentRequest,
    PercentShare, Share,
};

#[derive(Debug, Serialize)]
struct StatusChange {
    status: ExpenseStatus,
}

#[derive(Debug, Serialize)]
struct EqualSplitRequest {
    #[serde(rename = "usuarioIds")]
    user_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
struct PercentSplitRequest {
    #[serde(rename = "divisoes")]
    shares: Vec<PercentShare>,
}

/// Expense and share endpoints.
///
/// `split_equal_remote`/`split_percentage_remote` ask the server to mint
/// one share per user; the server applies the same reconciliation rule as
/// [`crate::split`], so local previews and server results agree.
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, ApiError>;
    async fn get_expense(&self, id: u64) -> Result<Expense, ApiError>;
    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError>;
    async fn update_expense(&self, id: u64, patch: &ExpensePatch) -> Result<Expense, ApiError>;
    async fn delete_expense(&self, id: u64) -> Result<(), ApiError>;
    async fn mark_expense_paid(&self, id: u64) -> Result<Expense, ApiError>;
    async fn reopen_expense(&self, id: u64) -> Result<Expense, ApiError>;
    /// Explicit status transition, used to confirm overdue detection.
    async fn set_expense_status(
        &self,
        id: u64,
        status: ExpenseStatus,
    ) -> Result<Expense, ApiError>;

    async fn list_shares(&self, expense_id: u64) -> Result<Vec<Share>, ApiError>;
    async fn create_share(&self, share: &NewShare) -> Result<Share, ApiError>;
    async fn split_equal_remote(
        &self,
        expense_id: u64,
        user_ids: &[u64],
    ) -> Result<Vec<Share>, ApiError>;
    async fn split_percentage_remote(
        &self,
        expense_id: u64,
        shares: &[PercentShare],
    ) -> Result<Vec<Share>, ApiError>;
    async fn mark_share_paid(
        &self,
        share_id: u64,
        payment: &PaymentRequest,
    ) -> Result<Share, ApiError>;
    async fn reopen_share(&self, share_id: u64) -> Result<Share, ApiError>;
}

impl ApiClient {
    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, ApiError> {
        let builder = self
            .http
            .get(self.endpoint("api/contas"))
            .query(&filter.query());
        self.send(builder, true, "list expenses").await
    }

    pub async fn get_expense(&self, id: u64) -> Result<Expense, ApiError> {
        let builder = self.http.get(self.endpoint(&format!("api/contas/{}", id)));
        self.send(builder, true, "fetch expense").await
    }

    pub async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        let builder = self.http.post(self.endpoint("api/contas")).json(expense);
        self.send(builder, true, "create expense").await
    }

    pub async fn update_expense(&self, id: u64, patch: &ExpensePatch) -> Result<Expense, ApiError> {
        let builder = self
            .http
            .put(self.endpoint(&format!("api/contas/{}", id)))
            .json(patch);
        self.send(builder, true, "update expense").await
    }

    pub async fn delete_expense(&self, id: u64) -> Result<(), ApiError> {
        let builder = self
            .http
            .delete(self.endpoint(&format!("api/contas/{}", id)));
        self.send_no_content(builder, true, "delete expense").await
    }

    pub async fn mark_expense_paid(&self, id: u64) -> Result<Expense, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/contas/{}/pagar", id)));
        self.send(builder, true, "mark expense paid").await
    }

    pub async fn reopen_expense(&self, id: u64) -> Result<Expense, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/contas/{}/reabrir", id)));
        self.send(builder, true, "reopen expense").await
    }

    pub async fn set_expense_status(
        &self,
        id: u64,
        status: ExpenseStatus,
    ) -> Result<Expense, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/contas/{}/status", id)))
            .json(&StatusChange { status });
        self.send(builder, true, "change expense status").await
    }

    pub async fn list_shares(&self, expense_id: u64) -> Result<Vec<Share>, ApiError> {
        let builder = self
            .http
            .get(self.endpoint(&format!("api/divisoes/conta/{}", expense_id)));
        self.send(builder, true, "list shares").await
    }

    pub async fn create_share(&self, share: &NewShare) -> Result<Share, ApiError> {
        let builder = self.http.post(self.endpoint("api/divisoes")).json(share);
        self.send(builder, true, "create share").await
    }

    pub async fn split_equal_remote(
        &self,
        expense_id: u64,
        user_ids: &[u64],
    ) -> Result<Vec<Share>, ApiError> {
        let body = EqualSplitRequest {
            user_ids: user_ids.to_vec(),
        };
        let builder = self
            .http
            .post(self.endpoint(&format!("api/divisoes/conta/{}/igual", expense_id)))
            .json(&body);
        self.send(builder, true, "split expense equally").await
    }

    pub async fn split_percentage_remote(
        &self,
        expense_id: u64,
        shares: &[PercentShare],
    ) -> Result<Vec<Share>, ApiError> {
        let body = PercentSplitRequest {
            shares: shares.to_vec(),
        };
        let builder = self
            .http
            .post(self.endpoint(&format!("api/divisoes/conta/{}/percentual", expense_id)))
            .json(&body);
        self.send(builder, true, "split expense by percentage").await
    }

    pub async fn mark_share_paid(
        &self,
        share_id: u64,
        payment: &PaymentRequest,
    ) -> Result<Share, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/divisoes/{}/pagar", share_id)))
            .json(payment);
        self.send(builder, true, "mark share paid").await
    }

    pub async fn reopen_share(&self, share_id: u64) -> Result<Share, ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/divisoes/{}/reabrir", share_id)));
        self.send(builder, true, "reopen share").await
    }
}

#[async_trait]
impl ExpenseApi for ApiClient {
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, ApiError> {
        ApiClient::list_expenses(self, filter).await
    }

    async fn get_expense(&self, id: u64) -> Result<Expense, ApiError> {
        ApiClient::get_expense(self, id).await
    }

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        ApiClient::create_expense(self, expense).await
    }

    async fn update_expense(&self, id: u64, patch: &ExpensePatch) -> Result<Expense, ApiError> {
        ApiClient::update_expense(self, id, patch).await
    }

    async fn delete_expense(&self, id: u64) -> Result<(), ApiError> {
        ApiClient::delete_expense(self, id).await
    }

    async fn mark_expense_paid(&self, id: u64) -> Result<Expense, ApiError> {
        ApiClient::mark_expense_paid(self, id).await
    }

    async fn reopen_expense(&self, id: u64) -> Result<Expense, ApiError> {
        ApiClient::reopen_expense(self, id).await
    }

    async fn set_expense_status(
        &self,
        id: u64,
        status: ExpenseStatus,
    ) -> Result<Expense, ApiError> {
        ApiClient::set_expense_status(self, id, status).await
    }

    async fn list_shares(&self, expense_id: u64) -> Result<Vec<Share>, ApiError> {
        ApiClient::list_shares(self, expense_id).await
    }

    async fn create_share(&self, share: &NewShare) -> Result<Share, ApiError> {
        ApiClient::create_share(self, share).await
    }

    async fn split_equal_remote(
        &self,
        expense_id: u64,
        user_ids: &[u64],
    ) -> Result<Vec<Share>, ApiError> {
        ApiClient::split_equal_remote(self, expense_id, user_ids).await
    }

    async fn split_percentage_remote(
        &self,
        expense_id: u64,
        shares: &[PercentShare],
    ) -> Result<Vec<Share>, ApiError> {
        ApiClient::split_percentage_remote(self, expense_id, shares).await
    }

    async fn mark_share_paid(
        &self,
        share_id: u64,
        payment: &PaymentRequest,
    ) -> Result<Share, ApiError> {
        ApiClient::mark_share_paid(self, share_id, payment).await
    }

    async fn reopen_share(&self, share_id: u64) -> Result<Share, ApiError> {
        ApiClient::reopen_share(self, share_id).await
    }
}
