//! Per-page composition of the gate components.
//!
//! A `PageContext` owns exactly one session oracle, one navigation guard and
//! one fetch interceptor. It subscribes to auth events before the page-load
//! check so no change is missed, and stops listening when closed or dropped.

use crate::auth_service::{AuthService, DataStore};
use crate::domains::DomainAuthorizer;
use crate::error::{AuthError, AuthResult};
use crate::guard::{GuardPolicy, NavigationGuard, PageKind};
use crate::guard_fsm::GuardState;
use crate::interceptor::{CredentialPolicy, FetchInterceptor};
use crate::location::Navigator;
use crate::login_page::{config_error_status, LoginPage, StatusLine};
use crate::redirect::RedirectPolicy;
use crate::session::SessionOracle;
use crate::signout::sign_out_and_return;
use crate::transport::{HttpResponse, HttpTransport, RequestInit, RequestTarget};
use crate::types::User;
use gate_config_and_utils::Config;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Settings shared by every page of the gate.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub authorizer: DomainAuthorizer,
    pub redirects: RedirectPolicy,
    /// Recorded with login audit rows.
    pub user_agent: Option<String>,
}

impl GateSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            authorizer: DomainAuthorizer::from_config(config),
            redirects: RedirectPolicy::from_config(config),
            user_agent: None,
        }
    }
}

/// External collaborators a page runs against.
#[derive(Clone)]
pub struct PageDeps {
    pub auth: Arc<dyn AuthService>,
    pub store: Option<Arc<dyn DataStore>>,
    pub transport: Arc<dyn HttpTransport>,
    pub navigator: Arc<dyn Navigator>,
}

/// How a page reacts when the auth service is not configured.
///
/// Protected pages fail closed by redirecting to login; the login page shows
/// the problem inline.
pub fn on_missing_config(
    kind: PageKind,
    navigator: &dyn Navigator,
    redirects: &RedirectPolicy,
    err: &AuthError,
) -> StatusLine {
    warn!(error = %err, page = ?kind, "Auth service is not configured");
    if kind == PageKind::Protected {
        navigator.replace(&redirects.login_url(&navigator.location()));
    }
    config_error_status(err)
}

/// One open page.
pub struct PageContext {
    kind: PageKind,
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    redirects: RedirectPolicy,
    oracle: Arc<SessionOracle>,
    guard: Arc<NavigationGuard>,
    interceptor: FetchInterceptor,
    login: Option<LoginPage>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl PageContext {
    /// Wire up the page and run the page-load check.
    pub async fn open(kind: PageKind, settings: GateSettings, deps: PageDeps) -> AuthResult<Self> {
        let oracle = Arc::new(SessionOracle::new(Arc::clone(&deps.auth)));

        let mut guard = NavigationGuard::new(
            Arc::clone(&oracle),
            Arc::clone(&deps.navigator),
            deps.store.clone(),
            GuardPolicy {
                page: kind,
                authorizer: settings.authorizer.clone(),
                redirects: settings.redirects.clone(),
            },
        );
        if let Some(user_agent) = settings.user_agent.clone() {
            guard = guard.with_user_agent(user_agent);
        }
        let guard = Arc::new(guard);

        let credential_policy = match kind {
            PageKind::Protected => CredentialPolicy::Enforce,
            PageKind::Login => CredentialPolicy::BestEffort,
        };
        let interceptor = FetchInterceptor::new(
            Arc::clone(&oracle),
            Arc::clone(&deps.transport),
            Arc::clone(&deps.navigator),
            settings.redirects.clone(),
            credential_policy,
        );

        let login = (kind == PageKind::Login).then(|| {
            LoginPage::new(
                Arc::clone(&deps.auth),
                Arc::clone(&deps.navigator),
                settings.authorizer.clone(),
                settings.redirects.clone(),
            )
        });

        let events = deps.auth.subscribe();
        let state = guard.on_page_load().await?;
        debug!(page = ?kind, state = ?state, "Page-load check finished");
        let listener = guard.spawn_listener(events);

        if let Some(login) = &login {
            login.initial_status();
        }

        Ok(Self {
            kind,
            auth: deps.auth,
            navigator: deps.navigator,
            redirects: settings.redirects,
            oracle,
            guard,
            interceptor,
            login,
            listener: Mutex::new(Some(listener)),
        })
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn state(&self) -> GuardState {
        self.guard.state()
    }

    pub fn authorized_user(&self) -> Option<User> {
        self.guard.authorized_user()
    }

    pub fn guard(&self) -> &Arc<NavigationGuard> {
        &self.guard
    }

    pub fn oracle(&self) -> &Arc<SessionOracle> {
        &self.oracle
    }

    pub fn interceptor(&self) -> &FetchInterceptor {
        &self.interceptor
    }

    /// Login form controller; only present on the login page.
    pub fn login_page(&self) -> Option<&LoginPage> {
        self.login.as_ref()
    }

    /// Fetch through this page's interceptor.
    pub async fn fetch(
        &self,
        target: impl Into<RequestTarget>,
        init: RequestInit,
    ) -> AuthResult<HttpResponse> {
        self.interceptor.fetch(target, init).await
    }

    /// Navbar sign-out: sign out and return to the login page.
    ///
    /// The page stops reacting to auth events first; the sign-out navigation
    /// is the last thing this page does.
    pub async fn sign_out(&self) -> String {
        self.stop_listener();
        sign_out_and_return(self.auth.as_ref(), self.navigator.as_ref(), &self.redirects).await
    }

    /// Stop reacting to auth events.
    pub fn close(self) {
        self.stop_listener();
    }

    fn stop_listener(&self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
            debug!(page = ?self.kind, "Page context closed");
        }
    }
}

impl Drop for PageContext {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
