//! Session, user, and auth event types shared by every gate component.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_sign_in_at: Option<String>,
}

impl User {
    /// Heuristic for "this verification is the user's first successful sign-in".
    ///
    /// True when no last-sign-in timestamp is recorded, or when it equals the
    /// account creation timestamp exactly. Clock skew and replays make this an
    /// approximation.
    pub fn looks_like_first_sign_in(&self) -> bool {
        let last_sign_in = self.last_sign_in_at.as_deref().filter(|v| !v.is_empty());
        let created = self.created_at.as_deref().filter(|v| !v.is_empty());

        match (last_sign_in, created) {
            (None, _) => true,
            (Some(last), Some(created)) => last == created,
            (Some(_), None) => false,
        }
    }
}

/// Credential bundle issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Expiry as unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    /// Whether the session carries a usable bearer credential.
    pub fn has_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    /// Whether the session is expired (or within `leeway_secs` of expiring).
    pub fn is_expired(&self, leeway_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now().timestamp() + leeway_secs,
            None => false,
        }
    }

    /// Fill `expires_at` from `expires_in` when the service omitted it.
    pub(crate) fn with_computed_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            if let Some(expires_in) = self.expires_in {
                self.expires_at = Some(Utc::now().timestamp() + expires_in);
            }
        }
        self
    }
}

/// Kind of auth state change pushed by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Auth state change notification. The session payload is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }

    /// Session carried by the event, ignoring any payload on sign-out.
    pub fn active_session(&self) -> Option<&Session> {
        match self.kind {
            AuthEventKind::SignedOut => None,
            _ => self.session.as_ref(),
        }
    }
}
