//! HTTP backend for the hosted row, auth and functions APIs

use super::{
    AuthBackend, AuthSession, AuthUser, Backend, ChangeFilter, ChangeStream, Query, Table, realtime,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Token response from the auth service
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(t: TokenResponse) -> Self {
        let expires_at = t
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp() + t.expires_in.unwrap_or(3600));
        Self {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at,
            user: t.user,
        }
    }
}

/// HTTP client for the hosted backend
pub struct RestBackend {
    client: Client,
    config: ClientConfig,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    /// Create a new backend client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            config: config.clone(),
            access_token: RwLock::new(None),
        })
    }

    /// Current bearer: the user's access token or the public key
    fn bearer(&self) -> String {
        self.access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer())
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.config.rest_url(), table)
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        response.json().await.map_err(Into::into)
    }

    async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        let message = error_message(&text);
        tracing::debug!(status = status.as_u16(), %message, "Backend request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            _ => ClientError::Backend {
                status: status.as_u16(),
                message,
            },
        })
    }

    // ========== Auth API ==========

    fn auth_request(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.config.auth_url(), path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> ClientResult<AuthSession> {
        let response = self
            .auth_request("token")
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;
        let token: TokenResponse = Self::handle_response(response).await?;
        Ok(token.into())
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, query: Query) -> ClientResult<Vec<Value>> {
        tracing::debug!(table = %query.table, "select");
        let response = self
            .request(Method::GET, self.table_url(query.table))
            .query(&query.to_params())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> ClientResult<Vec<Value>> {
        tracing::debug!(%table, count = rows.len(), "insert");
        let response = self
            .request(Method::POST, self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn update(&self, query: Query, patch: Value) -> ClientResult<Vec<Value>> {
        tracing::debug!(table = %query.table, "update");
        let params: Vec<(String, String)> = query
            .to_params()
            .into_iter()
            .filter(|(k, _)| k != "order" && k != "limit")
            .collect();
        let response = self
            .request(Method::PATCH, self.table_url(query.table))
            .header("Prefer", "return=representation")
            .query(&params)
            .json(&patch)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &str) -> ClientResult<()> {
        tracing::debug!(%table, on_conflict, "upsert");
        let response = self
            .request(Method::POST, self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", on_conflict)])
            .json(&row)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn invoke(&self, function: &str, body: Value) -> ClientResult<Value> {
        let url = format!("{}/{}", self.config.functions_url(), function);
        let response = self.request(Method::POST, url).json(&body).send().await?;
        let text = Self::check_status(response).await?.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn subscribe(&self, filter: ChangeFilter) -> ClientResult<ChangeStream> {
        let url = self.config.realtime_url()?;
        realtime::subscribe(url, self.bearer(), filter).await
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token;
    }
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<Option<AuthSession>> {
        let response = self
            .auth_request("signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;
        let body: Value = Self::handle_response(response).await?;
        // Without auto-confirm the service answers with the bare user
        if body.get("access_token").is_none() {
            return Ok(None);
        }
        let token: TokenResponse = serde_json::from_value(body)?;
        Ok(Some(token.into()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> ClientResult<AuthSession> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.config.auth_url()))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn admin_create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<AuthUser> {
        let key = self
            .config
            .service_role_key
            .as_deref()
            .ok_or_else(|| ClientError::Config("service role key is not configured".into()))?;
        let response = self
            .client
            .post(format!("{}/admin/users", self.config.auth_url()))
            .header("apikey", key)
            .bearer_auth(key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": { "full_name": full_name },
            }))
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
