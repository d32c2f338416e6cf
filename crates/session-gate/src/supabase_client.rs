//! Supabase-backed auth service and data store.
//!
//! Talks to GoTrue (`/auth/v1`) for OTP sign-in and session management and to
//! PostgREST (`/rest/v1`) for inserts. The client keeps the current session in
//! memory and broadcasts every change to subscribers.

use crate::auth_service::{AuthService, DataStore, OtpRequest, VerifyOtpRequest};
use crate::error::{AuthError, AuthResult};
use crate::types::{AuthEvent, Session};
use async_trait::async_trait;
use gate_config_and_utils::{Config, ServiceCredentials};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::broadcast;

/// Sessions this close to expiry are refreshed before being handed out.
const EXPIRY_LEEWAY_SECS: i64 = 30;

const EVENT_CHANNEL_CAPACITY: usize = 32;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Pull the human-readable message out of a GoTrue/PostgREST error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(String::from)
}

/// Supabase client implementing [`AuthService`] and [`DataStore`].
pub struct SupabaseAuthClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    persist_session: bool,
}

impl SupabaseAuthClient {
    /// Create a client for a project URL (e.g. `https://xyz.supabase.co`) and API key.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            session: Mutex::new(None),
            events,
            persist_session: true,
        }
    }

    /// Browser-side client using the anon key.
    pub fn from_config(config: &Config) -> AuthResult<Self> {
        let credentials = config.require_auth_service()?;
        Ok(Self::from_credentials(&credentials))
    }

    /// Server-side client using the service role key. Never keeps a session.
    pub fn service_role(config: &Config) -> AuthResult<Self> {
        let credentials = config.require_service_role()?;
        let mut client = Self::from_credentials(&credentials);
        client.persist_session = false;
        Ok(client)
    }

    fn from_credentials(credentials: &ServiceCredentials) -> Self {
        Self::new(credentials.url.as_str(), credentials.key.clone())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn current_session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    fn store_session(&self, session: Session) -> Session {
        let session = session.with_computed_expiry();
        if self.persist_session {
            *self.session.lock() = Some(session.clone());
        }
        session
    }

    fn clear_session(&self) {
        *self.session.lock() = None;
    }

    fn emit(&self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "Auth state changed");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Turn a non-2xx response into `AuthError::Remote` carrying the server's message.
    async fn ensure_success(
        response: reqwest::Response,
        context: &str,
    ) -> AuthResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body_summary = summarize_response_body(&body);
        tracing::error!(status = %status, body_summary = %body_summary, "{}", context);

        Err(AuthError::Remote(
            extract_error_message(&body).unwrap_or_else(|| format!("{}: {}", context, status)),
        ))
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session> {
        let response = self
            .http_client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let response = Self::ensure_success(response, "Failed to refresh session").await?;
        let session: Session = response.json().await?;
        Ok(self.store_session(session))
    }
}

#[async_trait]
impl AuthService for SupabaseAuthClient {
    async fn get_session(&self) -> AuthResult<Option<Session>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if !session.is_expired(EXPIRY_LEEWAY_SECS) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            tracing::info!("Session expired without refresh token; clearing");
            self.clear_session();
            self.emit(AuthEvent::signed_out());
            return Ok(None);
        };

        match self.refresh_session(&refresh_token).await {
            Ok(refreshed) => {
                tracing::info!(user_id = %refreshed.user.id, "Session refreshed");
                self.emit(AuthEvent::token_refreshed(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed; signing out locally");
                self.clear_session();
                self.emit(AuthEvent::signed_out());
                Err(AuthError::TokenRefresh(e.to_string()))
            }
        }
    }

    async fn sign_in_with_otp(&self, request: &OtpRequest) -> AuthResult<()> {
        let mut builder = self
            .http_client
            .post(self.auth_url("otp"))
            .header("apikey", &self.api_key)
            .json(request);
        if let Some(redirect_to) = &request.redirect_to {
            builder = builder.query(&[("redirect_to", redirect_to.as_str())]);
        }

        tracing::debug!(email = %request.email, "Requesting OTP");
        let response = builder.send().await?;
        Self::ensure_success(response, "Failed to send OTP").await?;
        tracing::info!(email = %request.email, "OTP requested");
        Ok(())
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> AuthResult<Session> {
        let response = self
            .http_client
            .post(self.auth_url("verify"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "type": request.channel.as_str(),
                "email": request.email,
                "token": request.token,
            }))
            .send()
            .await?;
        let response = Self::ensure_success(response, "Failed to verify OTP").await?;
        let session: Session = response.json().await?;
        if !session.has_token() {
            return Err(AuthError::Remote(
                "Verification succeeded without a session".to_string(),
            ));
        }

        let session = self.store_session(session);
        tracing::info!(user_id = %session.user.id, "OTP verified");
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let session = self.current_session();
        self.clear_session();

        let remote = match session {
            Some(session) => {
                let result = self
                    .http_client
                    .post(self.auth_url("logout"))
                    .header("apikey", &self.api_key)
                    .bearer_auth(&session.access_token)
                    .send()
                    .await;
                match result {
                    Ok(response) => Self::ensure_success(response, "Failed to sign out")
                        .await
                        .map(|_| ()),
                    Err(e) => Err(e.into()),
                }
            }
            None => Ok(()),
        };

        tracing::info!("Signed out");
        self.emit(AuthEvent::signed_out());
        remote
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl DataStore for SupabaseAuthClient {
    async fn insert(&self, table: &str, record: serde_json::Value) -> AuthResult<()> {
        let bearer = self
            .current_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.api_key.clone());

        tracing::debug!(table = %table, "Inserting row");
        let response = self
            .http_client
            .post(self.rest_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await?;
        Self::ensure_success(response, "Failed to insert row").await?;
        Ok(())
    }
}
