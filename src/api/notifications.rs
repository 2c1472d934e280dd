//! Notification endpoints.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{Notification, UnreadCount};

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn unread_count(&self) -> Result<UnreadCount, ApiError>;
    async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError>;
    async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError>;
    async fn mark_all_notifications_read(&self) -> Result<(), ApiError>;
}

impl ApiClient {
    pub async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
        let builder = self.http.get(self.endpoint("api/notificacoes/nao-lidas"));
        self.send(builder, true, "fetch unread count").await
    }

    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let builder = self.http.get(self.endpoint("api/notificacoes"));
        self.send(builder, true, "list notifications").await
    }

    pub async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError> {
        let builder = self
            .http
            .patch(self.endpoint(&format!("api/notificacoes/{}/ler", id)));
        self.send_no_content(builder, true, "mark notification read")
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let builder = self.http.patch(self.endpoint("api/notificacoes/ler-todas"));
        self.send_no_content(builder, true, "mark all notifications read")
            .await
    }
}

#[async_trait]
impl NotificationApi for ApiClient {
    async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
        ApiClient::unread_count(self).await
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        ApiClient::list_notifications(self).await
    }

    async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError> {
        ApiClient::mark_notification_read(self, id).await
    }

    async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        ApiClient::mark_all_notifications_read(self).await
    }
}
