//! Admin session against the upstream auth endpoints.
//!
//! Requests carry the access token as a bearer token. A 401 triggers one
//! token refresh and one retry; a failed refresh ends the session.

use log::{debug, error, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use crate::error::{CurrexError, Result};
use crate::store::{AdminTokens, RateStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    #[serde(default)]
    success: Option<bool>,
    token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    token: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyBody {
    valid: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct AdminAuth {
    client: Client,
    base_url: String,
    tokens: RwLock<AdminTokens>,
    store: Option<RateStore>,
}

impl AdminAuth {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        AdminAuth {
            client,
            base_url: base_url.into(),
            tokens: RwLock::new(AdminTokens::default()),
            store: None,
        }
    }

    pub fn with_tokens(mut self, tokens: AdminTokens) -> Self {
        self.tokens = RwLock::new(tokens);
        self
    }

    /// Persist token changes through `store`.
    pub fn with_store(mut self, store: RateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn tokens(&self) -> AdminTokens {
        self.tokens.read().await.clone()
    }

    pub async fn has_session(&self) -> bool {
        self.tokens.read().await.access.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, password: &str) -> Result<LoginResponse> {
        let response = self
            .client
            .post(self.url("/currex/admin/login"))
            .json(&json!({ "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "Login failed".to_string());
            warn!("Admin login rejected: {}", message);
            return Err(CurrexError::Auth(message));
        }

        let body: LoginBody = response.json().await?;
        let access_token = body
            .access_token
            .or(body.token)
            .ok_or_else(|| CurrexError::Auth("Login failed".to_string()))?;

        self.set_tokens(AdminTokens {
            access: Some(access_token.clone()),
            refresh: body.refresh_token.clone(),
        })
        .await;
        info!("Admin logged in");

        Ok(LoginResponse {
            success: body.success.unwrap_or(true),
            token: access_token.clone(),
            access_token,
            refresh_token: body.refresh_token,
            expires_at: body.expires_at,
        })
    }

    /// Asks the backend whether `token` is a live admin token. Any failure
    /// counts as "no".
    pub async fn verify_token(&self, token: &str) -> bool {
        let response = self
            .client
            .post(self.url("/currex/admin/verify"))
            .bearer_auth(token)
            .json(&json!({ "token": token }))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => response
                .json::<VerifyBody>()
                .await
                .map(|body| body.valid)
                .unwrap_or(false),
            Ok(response) => {
                debug!("Token verification returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Token verification failed: {}", e);
                false
            }
        }
    }

    /// Exchanges the refresh token for a new access token. On any failure
    /// the whole session is cleared.
    pub async fn refresh(&self) -> Option<String> {
        let refresh_token = self.tokens.read().await.refresh.clone()?;

        match self.request_refresh(&refresh_token).await {
            Ok(Some(access)) => {
                self.set_tokens(AdminTokens {
                    access: Some(access.clone()),
                    refresh: Some(refresh_token),
                })
                .await;
                Some(access)
            }
            Ok(None) => {
                self.logout().await;
                None
            }
            Err(e) => {
                error!("Token refresh failed: {}", e);
                self.logout().await;
                None
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.url("/refresh"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Refresh endpoint returned {}", response.status());
            return Ok(None);
        }

        let body: RefreshBody = response.json().await?;
        Ok(body.access_token.or(body.token))
    }

    /// Sends the request built by `build` with the current bearer token. On a
    /// 401, and only if a refresh token exists, refreshes once and retries
    /// once; the second response is returned as is.
    pub async fn authenticated_request<F>(&self, url: &str, build: F) -> Result<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let tokens = self.tokens().await;
        let response = self.send(&build, url, tokens.access.as_deref()).await?;

        let retryable = response.status() == StatusCode::UNAUTHORIZED
            && tokens.refresh.is_some()
            && !url.contains("/refresh");
        if !retryable {
            return Ok(response);
        }

        info!("Access token expired, attempting refresh");
        match self.refresh().await {
            Some(access) => self.send(&build, url, Some(&access)).await,
            None => Ok(response),
        }
    }

    async fn send<F>(&self, build: &F, url: &str, access: Option<&str>) -> Result<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let mut request = build(&self.client, url);
        if let Some(access) = access {
            request = request.bearer_auth(access);
        }
        Ok(request.send().await?)
    }

    pub async fn logout(&self) {
        self.set_tokens(AdminTokens::default()).await;
    }

    async fn set_tokens(&self, tokens: AdminTokens) {
        *self.tokens.write().await = tokens.clone();

        if let Some(store) = &self.store {
            if let Err(e) = store.save_tokens(&tokens).await {
                error!("Failed to persist admin tokens: {}", e);
            }
        }
    }
}
