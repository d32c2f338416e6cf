//! In-memory session cache in front of the auth service.
//!
//! The `SessionOracle` is the only shared mutable session state on a page. It
//! is written by explicit lookups and by auth-state-change events; events are
//! authoritative, so a lookup that was in flight when an event arrived never
//! overwrites the event's payload.

use crate::auth_service::AuthService;
use crate::types::{AuthEvent, Session};
use crate::{AuthError, AuthResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct SessionCache {
    session: Option<Session>,
    /// Bumped on every event so in-flight lookups can detect they are stale.
    generation: u64,
}

/// Per-page session cache.
pub struct SessionOracle {
    auth: Arc<dyn AuthService>,
    cache: Mutex<SessionCache>,
}

impl SessionOracle {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self {
            auth,
            cache: Mutex::new(SessionCache::default()),
        }
    }

    /// Underlying auth service.
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.auth
    }

    /// Cached session without touching the auth service.
    pub fn cached(&self) -> Option<Session> {
        self.cache.lock().session.clone()
    }

    /// Current session: the cached one if still valid, otherwise a fresh lookup.
    pub async fn get_session(&self) -> AuthResult<Option<Session>> {
        let generation = {
            let cache = self.cache.lock();
            if let Some(session) = cache.session.as_ref().filter(|s| !s.is_expired(0)) {
                return Ok(Some(session.clone()));
            }
            cache.generation
        };

        let fetched = self.auth.get_session().await?;

        let mut cache = self.cache.lock();
        if cache.generation == generation {
            cache.session = fetched;
        } else {
            debug!("Auth event arrived during session lookup; keeping event payload");
        }
        Ok(cache.session.clone())
    }

    /// Bearer token for the current session, `None` when signed out.
    pub async fn get_access_token(&self) -> AuthResult<Option<String>> {
        Ok(self
            .get_session()
            .await?
            .filter(Session::has_token)
            .map(|s| s.access_token))
    }

    /// Like [`get_session`](Self::get_session) but a missing session or token is an error.
    pub async fn require_session(&self) -> AuthResult<Session> {
        match self.get_session().await? {
            Some(session) if session.has_token() => Ok(session),
            Some(_) => Err(AuthError::Unauthenticated(
                "session has no access token".to_string(),
            )),
            None => Err(AuthError::Unauthenticated("no active session".to_string())),
        }
    }

    /// Overwrite the cache with an event's session payload.
    pub fn apply_event(&self, event: &AuthEvent) {
        let mut cache = self.cache.lock();
        cache.session = event.active_session().cloned();
        cache.generation += 1;
        debug!(
            kind = ?event.kind,
            has_session = cache.session.is_some(),
            generation = cache.generation,
            "Session cache updated from auth event"
        );
    }
}
