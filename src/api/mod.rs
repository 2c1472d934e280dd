//! Typed HTTP client for the RachaConta server.
//!
//! ## Endpoints
//!
//! - `POST /auth/login`, `POST /auth/register`, `POST /auth/refresh`
//! - `GET|POST /api/contas`, `GET|PUT|DELETE /api/contas/{id}`
//! - `PATCH /api/contas/{id}/pagar`, `PATCH /api/contas/{id}/reabrir`
//! - `GET /api/divisoes/conta/{id}`, `POST /api/divisoes`
//! - `POST /api/divisoes/conta/{id}/igual`, `POST /api/divisoes/conta/{id}/percentual`
//! - `PATCH /api/divisoes/{id}/pagar`, `PATCH /api/divisoes/{id}/reabrir`
//! - `GET|POST /api/dividas`, `PATCH /api/dividas/{id}/pagar`, `GET /api/dividas/saldo/{id}`
//! - `POST /api/pagamentos-externos`, `GET /api/pagamentos-externos/conta/{id}`
//! - `GET /api/pagamentos-externos/public/{linkId}` (no auth)
//! - `POST /api/pagamentos-externos/public/{linkId}/confirmar` (no auth)
//! - friendships, groups, invitations and notifications under `/api/...`
//!
//! Every authenticated request carries the session bearer token. On a 401
//! the client silently tries `POST /auth/refresh` exactly once and retries
//! the original request; if the refresh fails the session is cleared and
//! the caller sees [`ApiError::Unauthorized`].

mod auth;
mod debts;
mod expenses;
mod friendships;
mod groups;
mod invitations;
mod notifications;
mod payment_links;

pub use auth::AuthApi;
pub use debts::DebtApi;
pub use expenses::ExpenseApi;
pub use friendships::FriendshipApi;
pub use groups::GroupApi;
pub use invitations::InvitationApi;
pub use notifications::NotificationApi;
pub use payment_links::PaymentLinkApi;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::ApiError;
use crate::model::ErrorBody;
use crate::session::SharedSessionStore;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

/// HTTP client bound to one server and one session store.
///
/// Cheap to clone; clones share the connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: SharedSessionStore,
}

impl ApiClient {
    pub fn new(config: &Config, session: SharedSessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        // Normalize so endpoint paths can always be appended.
        let mut base = config.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http,
            base,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.session.token().await.ok_or(ApiError::Unauthorized)?;
        Ok(builder.bearer_auth(token))
    }

    /// Swap the session token via `POST /auth/refresh`.
    ///
    /// Any failure signs the session out so the caller lands on the
    /// sign-in path instead of looping on a dead token.
    async fn refresh_token(&self) -> Result<(), ApiError> {
        let token = match self.session.token().await {
            Some(t) => t,
            None => return Err(ApiError::Unauthorized),
        };

        let result = async {
            let response = self
                .http
                .post(self.endpoint("auth/refresh"))
                .bearer_auth(&token)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(ApiError::Unauthorized);
            }
            response
                .json::<RefreshResponse>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
        .await;

        match result {
            Ok(refreshed) => {
                tracing::debug!("session token refreshed");
                self.session.update_token(refreshed.token).await;
                Ok(())
            }
            Err(e) => {
                tracing::info!("token refresh failed, signing out: {}", e);
                self.session.clear().await;
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// Send a request, transparently refreshing the token once on a 401.
    async fn send_raw(
        &self,
        builder: RequestBuilder,
        authenticated: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let retry = builder.try_clone();
        let builder = if authenticated {
            self.authorize(builder).await?
        } else {
            builder
        };

        let response = builder.send().await.map_err(ApiError::from)?;
        if !authenticated || response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let retry = match retry {
            Some(r) => r,
            None => {
                self.session.clear().await;
                return Err(ApiError::Unauthorized);
            }
        };

        tracing::debug!("request got 401, attempting token refresh");
        self.refresh_token().await?;

        let retry = self.authorize(retry).await?;
        let response = retry.send().await.map_err(ApiError::from)?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.session.clear().await;
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        authenticated: bool,
        action: &str,
    ) -> Result<T, ApiError> {
        let response = self.send_raw(builder, authenticated).await?;
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        } else {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            Err(ApiError::from_status(status.as_u16(), body, action))
        }
    }

    /// Like [`send`](Self::send) but discards any response body.
    async fn send_no_content(
        &self,
        builder: RequestBuilder,
        authenticated: bool,
        action: &str,
    ) -> Result<(), ApiError> {
        let response = self.send_raw(builder, authenticated).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            Err(ApiError::from_status(status.as_u16(), body, action))
        }
    }
}
