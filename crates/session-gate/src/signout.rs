//! Navbar sign-out action.

use crate::auth_service::AuthService;
use crate::location::Navigator;
use crate::redirect::RedirectPolicy;
use tracing::{info, warn};

/// Sign out and send the visitor to the login page.
///
/// The redirect happens even when the auth service fails to sign out.
pub async fn sign_out_and_return(
    auth: &dyn AuthService,
    navigator: &dyn Navigator,
    redirects: &RedirectPolicy,
) -> String {
    if let Err(e) = auth.sign_out().await {
        warn!(error = %e, "Sign out failed; redirecting anyway");
    }

    let destination = redirects.sign_out_url();
    info!(destination = %destination, "Signed out, returning to login");
    navigator.replace(&destination);
    destination
}
