//! Navigation guard: decides whether a page may render and where to send the visitor.
//!
//! Decisions are made by the pure [`reduce`] function, which maps the previous
//! guard state and one [`GuardEvent`] to the next state plus a list of
//! [`GuardEffect`]s. [`NavigationGuard`] feeds it page-load lookups and auth
//! events and carries out the effects in order.

use crate::auth_service::DataStore;
use crate::domains::DomainAuthorizer;
use crate::guard_fsm::{GuardMachine, GuardMachineInput, GuardMachineState, GuardState};
use crate::location::{Navigator, PageLocation};
use crate::redirect::RedirectPolicy;
use crate::session::SessionOracle;
use crate::types::{AuthEvent, AuthEventKind, Session, User};
use crate::{AuthError, AuthResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Table receiving one row per successful sign-in.
pub const LOGIN_AUDIT_TABLE: &str = "user_logins";

/// Which kind of page the guard runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// The OTP login page: authorized visitors are sent onwards.
    Login,
    /// Any page behind the gate: unauthorized visitors are sent to login.
    Protected,
}

/// Input to the guard reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    /// Page-load session lookup finished.
    SessionResolved(Option<Session>),
    /// Page-load session lookup failed; treated as no session.
    SessionLookupFailed(String),
    /// Auth service pushed a state change.
    AuthStateChanged(AuthEvent),
}

/// Side effect requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEffect {
    /// Replace-navigate to the destination.
    Redirect(String),
    /// Make the authorized user available to the page.
    ExposeUser(User),
    ClearUser,
    /// Write a login audit row (never blocks the flow).
    RecordLogin(User),
    /// A signed-in visitor's email is not on the allow-list.
    RejectEmail { email: String },
}

/// Static configuration of one guard instance.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub page: PageKind,
    pub authorizer: DomainAuthorizer,
    pub redirects: RedirectPolicy,
}

/// Pure guard transition.
///
/// Every event re-enters `Checking`, then settles on `Authorized` when the
/// event yields a session with a token and an allowed email, `Unauthorized`
/// otherwise.
pub fn reduce(
    previous: GuardState,
    event: &GuardEvent,
    policy: &GuardPolicy,
    location: &PageLocation,
) -> AuthResult<(GuardState, Vec<GuardEffect>)> {
    let mut machine = GuardMachine::from_state(GuardMachineState::from(previous));
    consume(&mut machine, GuardMachineInput::Check)?;

    let session = match event {
        GuardEvent::SessionResolved(session) => session.as_ref(),
        GuardEvent::SessionLookupFailed(_) => None,
        GuardEvent::AuthStateChanged(auth_event) => auth_event.active_session(),
    }
    .filter(|session| session.has_token());

    let authorized = session.filter(|session| policy.authorizer.is_allowed(session.email()));

    let effects = match authorized {
        Some(session) => {
            consume(&mut machine, GuardMachineInput::Allow)?;
            allow_effects(event, session, policy, location)
        }
        None => {
            consume(&mut machine, GuardMachineInput::Deny)?;
            deny_effects(session, policy, location)
        }
    };

    Ok((GuardState::from(machine.state()), effects))
}

fn consume(machine: &mut GuardMachine, input: GuardMachineInput) -> AuthResult<()> {
    machine.consume(&input).map(|_| ()).map_err(|_| {
        AuthError::InvalidStateTransition(format!(
            "cannot apply {:?} in state {:?}",
            input,
            machine.state()
        ))
    })
}

fn allow_effects(
    event: &GuardEvent,
    session: &Session,
    policy: &GuardPolicy,
    location: &PageLocation,
) -> Vec<GuardEffect> {
    let user = session.user.clone();
    match policy.page {
        PageKind::Protected => vec![GuardEffect::ExposeUser(user)],
        PageKind::Login => {
            let destination = policy.redirects.post_sign_in_destination(location, &user);
            match event {
                GuardEvent::AuthStateChanged(AuthEvent {
                    kind: AuthEventKind::SignedIn,
                    ..
                }) => vec![
                    GuardEffect::RecordLogin(user),
                    GuardEffect::Redirect(destination),
                ],
                GuardEvent::AuthStateChanged(_) => vec![GuardEffect::ExposeUser(user)],
                _ => vec![GuardEffect::Redirect(destination)],
            }
        }
    }
}

fn deny_effects(
    session: Option<&Session>,
    policy: &GuardPolicy,
    location: &PageLocation,
) -> Vec<GuardEffect> {
    match policy.page {
        PageKind::Protected => vec![
            GuardEffect::ClearUser,
            GuardEffect::Redirect(policy.redirects.login_url(location)),
        ],
        PageKind::Login => match session {
            Some(session) => vec![
                GuardEffect::ClearUser,
                GuardEffect::RejectEmail {
                    email: session.email().unwrap_or_default().to_string(),
                },
            ],
            None => vec![GuardEffect::ClearUser],
        },
    }
}

/// Runtime around [`reduce`] for one page.
pub struct NavigationGuard {
    oracle: Arc<SessionOracle>,
    navigator: Arc<dyn Navigator>,
    store: Option<Arc<dyn DataStore>>,
    policy: GuardPolicy,
    user_agent: Option<String>,
    state: Mutex<GuardState>,
    user: Mutex<Option<User>>,
    rejected_email: Mutex<Option<String>>,
    last_redirect: Mutex<Option<String>>,
    /// Serializes dispatches so effects run in event delivery order.
    dispatch_lock: tokio::sync::Mutex<()>,
}

impl NavigationGuard {
    pub fn new(
        oracle: Arc<SessionOracle>,
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn DataStore>>,
        policy: GuardPolicy,
    ) -> Self {
        Self {
            oracle,
            navigator,
            store,
            policy,
            user_agent: None,
            state: Mutex::new(GuardState::Unknown),
            user: Mutex::new(None),
            rejected_email: Mutex::new(None),
            last_redirect: Mutex::new(None),
            dispatch_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// User-agent string recorded with login audit rows.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn state(&self) -> GuardState {
        *self.state.lock()
    }

    /// User exposed to the page while authorized.
    pub fn authorized_user(&self) -> Option<User> {
        self.user.lock().clone()
    }

    /// Email most recently refused by the allow-list, if any.
    pub fn rejected_email(&self) -> Option<String> {
        self.rejected_email.lock().clone()
    }

    /// The exposed user, or why there is none.
    pub fn require_user(&self) -> AuthResult<User> {
        if let Some(user) = self.authorized_user() {
            return Ok(user);
        }
        match self.rejected_email() {
            Some(email) => Err(AuthError::Unauthorized(email)),
            None => Err(AuthError::Unauthenticated(format!(
                "guard is {:?}",
                self.state()
            ))),
        }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Run the page-load check.
    pub async fn on_page_load(&self) -> AuthResult<GuardState> {
        let event = match self.oracle.get_session().await {
            Ok(session) => GuardEvent::SessionResolved(session),
            Err(e) => {
                warn!(error = %e, "Session lookup failed; treating as signed out");
                GuardEvent::SessionLookupFailed(e.to_string())
            }
        };
        self.dispatch(event).await
    }

    /// React to an auth state change. The session cache is updated first.
    pub async fn on_auth_event(&self, event: AuthEvent) -> AuthResult<GuardState> {
        self.oracle.apply_event(&event);
        self.dispatch(GuardEvent::AuthStateChanged(event)).await
    }

    async fn dispatch(&self, event: GuardEvent) -> AuthResult<GuardState> {
        let _ordered = self.dispatch_lock.lock().await;
        let location = self.navigator.location();

        let (previous, next, effects) = {
            let mut state = self.state.lock();
            let previous = *state;
            let (next, effects) = reduce(previous, &event, &self.policy, &location)?;
            if previous != next {
                debug!(from = ?previous, to = ?next, "Guard state transition");
            }
            *state = next;
            (previous, next, effects)
        };

        for effect in effects {
            if let GuardEffect::Redirect(destination) = &effect {
                // Already sent there while unauthorized; the page is leaving.
                if previous == GuardState::Unauthorized
                    && self.last_redirect.lock().as_deref() == Some(destination.as_str())
                {
                    debug!(destination = %destination, "Redirect already issued");
                    continue;
                }
            }
            self.apply(effect).await;
        }
        Ok(next)
    }

    async fn apply(&self, effect: GuardEffect) {
        match effect {
            GuardEffect::Redirect(destination) => {
                info!(destination = %destination, "Redirecting");
                self.navigator.replace(&destination);
                *self.last_redirect.lock() = Some(destination);
            }
            GuardEffect::ExposeUser(user) => {
                *self.rejected_email.lock() = None;
                *self.user.lock() = Some(user);
            }
            GuardEffect::ClearUser => {
                *self.user.lock() = None;
            }
            GuardEffect::RecordLogin(user) => {
                self.record_login(&user).await;
            }
            GuardEffect::RejectEmail { email } => {
                warn!(email = %email, "Signed-in email is not on the allow-list");
                *self.user.lock() = None;
                *self.rejected_email.lock() = Some(email);
            }
        }
    }

    /// Best-effort login audit row; failures are logged and swallowed.
    pub async fn record_login(&self, user: &User) {
        let Some(store) = &self.store else {
            return;
        };

        let row = serde_json::json!({
            "user_id": user.id,
            "email": user.email,
            "user_agent": self.user_agent,
        });

        match store.insert(LOGIN_AUDIT_TABLE, row).await {
            Ok(()) => debug!(user_id = %user.id, "Login recorded"),
            Err(e) => warn!(error = %e, "Login logging failed (non-blocking)"),
        }
    }

    /// Handle every event already queued on `events` without waiting.
    ///
    /// Returns how many events were processed.
    pub async fn process_pending(
        &self,
        events: &mut broadcast::Receiver<AuthEvent>,
    ) -> AuthResult<usize> {
        let mut processed = 0;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    self.on_auth_event(event).await?;
                    processed += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth events dropped; re-checking session");
                    self.on_page_load().await?;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Ok(processed)
    }

    /// React to auth events for as long as the channel stays open.
    pub fn spawn_listener(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<AuthEvent>,
    ) -> JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let result = match events.recv().await {
                    Ok(event) => guard.on_auth_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth events dropped; re-checking session");
                        guard.on_page_load().await
                    }
                    Err(RecvError::Closed) => break,
                };
                if let Err(e) = result {
                    warn!(error = %e, "Guard failed to handle auth event");
                }
            }
            debug!("Auth event listener stopped");
        })
    }
}
