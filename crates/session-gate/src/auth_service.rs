//! Contracts for the external auth service and data store.

use crate::types::{AuthEvent, Session};
use crate::AuthResult;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

/// Request to email a one-time passcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpRequest {
    pub email: String,
    /// Create the account on first use.
    pub create_user: bool,
    /// Callback URL embedded in the email's magic link.
    #[serde(skip)]
    pub redirect_to: Option<String>,
}

/// Delivery channel the passcode was sent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpChannel {
    Email,
}

impl OtpChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpChannel::Email => "email",
        }
    }
}

/// Request to exchange a passcode for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub token: String,
    pub channel: OtpChannel,
}

/// Identity provider issuing OTP codes and sessions.
///
/// Implementations own session storage and push every change through
/// [`AuthService::subscribe`], in the order the changes happened.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Current session, or `None` when nobody is signed in.
    async fn get_session(&self) -> AuthResult<Option<Session>>;

    /// Send a one-time passcode to the given address.
    async fn sign_in_with_otp(&self, request: &OtpRequest) -> AuthResult<()>;

    /// Verify a passcode; establishes a session and emits `SignedIn`.
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> AuthResult<Session>;

    /// Invalidate the current session and emit `SignedOut`.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Subscribe to auth state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Record store used for login audit rows.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Insert one row into `table`.
    async fn insert(&self, table: &str, record: serde_json::Value) -> AuthResult<()>;
}
