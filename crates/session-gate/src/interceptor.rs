//! Authenticated fetch: attaches bearer credentials to protected API calls.

use crate::location::{Navigator, PageLocation};
use crate::redirect::RedirectPolicy;
use crate::session::SessionOracle;
use crate::transport::{HttpResponse, HttpTransport, OutgoingRequest, RequestInit, RequestTarget};
use crate::AuthResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Same-origin paths under this prefix require a bearer credential.
pub const PROTECTED_PREFIX: &str = "/api/";

/// Whether a fetch target needs credentials.
///
/// `Err` means the URL could not be normalized; callers treat that as not
/// protected but it stays distinguishable from a plain `false`.
pub fn classify(target: &RequestTarget, location: &PageLocation) -> Result<bool, url::ParseError> {
    let url = location.join(target.raw_url())?;
    Ok(url.origin() == location.url().origin() && url.path().starts_with(PROTECTED_PREFIX))
}

/// What to do when no credential can be attached to a protected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// Abort the call, redirect to login and return the error (protected pages).
    Enforce,
    /// Attach a token if one is available, otherwise send as is (login page).
    BestEffort,
}

/// Wraps an [`HttpTransport`] and injects `Authorization: Bearer` on protected calls.
pub struct FetchInterceptor {
    oracle: Arc<SessionOracle>,
    transport: Arc<dyn HttpTransport>,
    navigator: Arc<dyn Navigator>,
    redirects: RedirectPolicy,
    policy: CredentialPolicy,
}

impl FetchInterceptor {
    pub fn new(
        oracle: Arc<SessionOracle>,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
        redirects: RedirectPolicy,
        policy: CredentialPolicy,
    ) -> Self {
        Self {
            oracle,
            transport,
            navigator,
            redirects,
            policy,
        }
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    /// Issue a request, resolving credentials first when the target is protected.
    pub async fn fetch(
        &self,
        target: impl Into<RequestTarget>,
        init: RequestInit,
    ) -> AuthResult<HttpResponse> {
        let target = target.into();
        let location = self.navigator.location();

        let protected = match classify(&target, &location) {
            Ok(protected) => protected,
            Err(e) => {
                debug!(url = %target.raw_url(), error = %e, "Unparseable fetch target; not protected");
                false
            }
        };

        let mut request = OutgoingRequest::resolve(target, init, &location);

        if protected {
            match self.policy {
                CredentialPolicy::Enforce => {
                    let attached = match self.oracle.require_session().await {
                        Ok(session) => request.set_bearer(&session.access_token),
                        Err(e) => Err(e),
                    };
                    if let Err(e) = attached {
                        warn!(error = %e, url = %request.url, "Failed to attach auth header, redirecting to login");
                        self.navigator.replace(&self.redirects.login_url(&location));
                        return Err(e);
                    }
                }
                CredentialPolicy::BestEffort => match self.oracle.get_access_token().await {
                    Ok(Some(token)) => {
                        if let Err(e) = request.set_bearer(&token) {
                            warn!(error = %e, "Failed to attach auth header");
                        }
                    }
                    Ok(None) => debug!(url = %request.url, "No session; sending without credentials"),
                    Err(e) => warn!(error = %e, "Failed to attach auth header"),
                },
            }
        }

        self.transport.send(request).await
    }
}
