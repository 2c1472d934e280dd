//! Sign-in, registration and token refresh.
//!
//! Login and registration are the only unauthenticated calls besides the
//! public payment-link endpoints. Refresh lives on the core client since
//! the 401-retry path needs it.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::{AuthResponse, Credentials, Registration};

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError>;
}

impl ApiClient {
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let builder = self
            .http
            .post(self.endpoint("auth/login"))
            .json(credentials);
        self.send(builder, false, "sign in").await
    }

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let builder = self
            .http
            .post(self.endpoint("auth/register"))
            .json(registration);
        self.send(builder, false, "register").await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        ApiClient::sign_in(self, credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        ApiClient::register(self, registration).await
    }
}
