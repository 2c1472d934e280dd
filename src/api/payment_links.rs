//! External payment-link endpoints.
//!
//! The `public/` routes are the only part of the API an external
//! participant ever touches; they are unauthenticated on purpose, with
//! the unguessable link id as the sole capability.

use async_trait::async_trait;
use uuid::Uuid;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{ExternalPayment, NewPaymentLink, PaymentLinkCreated, PaymentRequest};

#[async_trait]
pub trait PaymentLinkApi: Send + Sync {
    async fn create_payment_link(
        &self,
        link: &NewPaymentLink,
    ) -> Result<PaymentLinkCreated, ApiError>;
    async fn list_payment_links(&self, expense_id: u64)
        -> Result<Vec<ExternalPayment>, ApiError>;
    /// Unauthenticated; what the link page shows before confirming.
    async fn get_payment_link(&self, link_id: Uuid) -> Result<ExternalPayment, ApiError>;
    /// Unauthenticated one-shot confirmation. A second call fails.
    async fn confirm_payment_link(
        &self,
        link_id: Uuid,
        payment: &PaymentRequest,
    ) -> Result<ExternalPayment, ApiError>;
}

impl ApiClient {
    pub async fn create_payment_link(
        &self,
        link: &NewPaymentLink,
    ) -> Result<PaymentLinkCreated, ApiError> {
        let builder = self
            .http
            .post(self.endpoint("api/pagamentos-externos"))
            .json(link);
        self.send(builder, true, "create payment link").await
    }

    pub async fn list_payment_links(
        &self,
        expense_id: u64,
    ) -> Result<Vec<ExternalPayment>, ApiError> {
        let builder = self
            .http
            .get(self.endpoint(&format!("api/pagamentos-externos/conta/{}", expense_id)));
        self.send(builder, true, "list payment links").await
    }

    pub async fn get_payment_link(&self, link_id: Uuid) -> Result<ExternalPayment, ApiError> {
        let builder = self
            .http
            .get(self.endpoint(&format!("api/pagamentos-externos/public/{}", link_id)));
        self.send(builder, false, "fetch payment link").await
    }

    pub async fn confirm_payment_link(
        &self,
        link_id: Uuid,
        payment: &PaymentRequest,
    ) -> Result<ExternalPayment, ApiError> {
        let builder = self
            .http
            .post(self.endpoint(&format!(
                "api/pagamentos-externos/public/{}/confirmar",
                link_id
            )))
            .json(payment);
        self.send(builder, false, "confirm payment link").await
    }
}

#[async_trait]
impl PaymentLinkApi for ApiClient {
    async fn create_payment_link(
        &self,
        link: &NewPaymentLink,
    ) -> Result<PaymentLinkCreated, ApiError> {
        ApiClient::create_payment_link(self, link).await
    }

    async fn list_payment_links(
        &self,
        expense_id: u64,
    ) -> Result<Vec<ExternalPayment>, ApiError> {
        ApiClient::list_payment_links(self, expense_id).await
    }

    async fn get_payment_link(&self, link_id: Uuid) -> Result<ExternalPayment, ApiError> {
        ApiClient::get_payment_link(self, link_id).await
    }

    async fn confirm_payment_link(
        &self,
        link_id: Uuid,
        payment: &PaymentRequest,
    ) -> Result<ExternalPayment, ApiError> {
        ApiClient::confirm_payment_link(self, link_id, payment).await
    }
}
