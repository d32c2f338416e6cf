//! Interactive OTP login through the page gate.
//!
//! Mirrors a visitor's path: open the login page, request a code, verify it,
//! follow the guard's redirect onto a protected page, then call the page's
//! API endpoints through the enforcing interceptor.

use super::prompt;
use crate::navigator::ConsoleNavigator;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use gate_config_and_utils::Config;
use session_gate::{
    on_missing_config, GateSettings, Navigator, PageContext, PageDeps, PageKind,
    ReqwestTransport, RequestInit, SupabaseAuthClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long to wait for the guard to act on a successful verification.
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct LoginArgs {
    pub email: String,
    pub page_url: String,
    pub fetch: Vec<String>,
}

pub async fn login(config: &Config, args: LoginArgs, format: &OutputFormat) -> Result<()> {
    let navigator = Arc::new(ConsoleNavigator::new(&args.page_url)?);
    let mut settings = GateSettings::from_config(config);
    settings.user_agent = Some(format!("admin-gate/{}", env!("CARGO_PKG_VERSION")));

    let auth = match SupabaseAuthClient::from_config(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            let status =
                on_missing_config(PageKind::Login, navigator.as_ref(), &settings.redirects, &e);
            output::print_status(&status, format);
            return Err(e.into());
        }
    };

    let deps = PageDeps {
        auth: auth.clone(),
        store: Some(auth.clone()),
        transport: Arc::new(ReqwestTransport::default()),
        navigator: navigator.clone(),
    };

    let seen = navigator.navigation_count();
    let login_page = PageContext::open(PageKind::Login, settings.clone(), deps.clone()).await?;

    let destination = if navigator.navigation_count() > seen {
        let destination = navigator.last_destination().unwrap_or_default();
        debug!(destination = %destination, "Session already present");
        destination
    } else {
        sign_in_with_code(&login_page, &navigator, seen, &args.email, format).await?
    };
    login_page.close();
    info!(destination = %destination, "Leaving login page");

    let page = PageContext::open(PageKind::Protected, settings, deps).await?;
    let user = page.guard().require_user().with_context(|| {
        format!(
            "protected page refused the session; sent to {}",
            navigator.location().relative()
        )
    })?;

    output::print_heading("Signed in");
    output::print_row("User", &user.id);
    output::print_row("Email", user.email.as_deref().unwrap_or("-"));
    output::print_row("Page", &navigator.location().relative());

    for path in &args.fetch {
        match page.fetch(path.as_str(), RequestInit::default()).await {
            Ok(response) => output::print_row(path, &response.status.to_string()),
            Err(e) => output::print_row(path, &format!("failed: {e}")),
        }
    }

    let destination = page.sign_out().await;
    output::print_success(&format!("Signed out, returned to {}", destination), format);
    Ok(())
}

/// Send a code, read it from stdin, verify it and wait for the guard's redirect.
async fn sign_in_with_code(
    login_page: &PageContext,
    navigator: &ConsoleNavigator,
    seen: usize,
    email: &str,
    format: &OutputFormat,
) -> Result<String> {
    let form = login_page
        .login_page()
        .context("login page has no form controller")?;

    let status = form.send_code(email).await;
    output::print_status(&status, format);
    if status.is_error() {
        bail!("could not send a code to {}", email);
    }

    let code = prompt("OTP code: ")?;
    let status = form.verify(None, &code).await;
    output::print_status(&status, format);
    if status.is_error() {
        bail!("verification failed");
    }

    navigator
        .wait_for_navigation(seen, REDIRECT_TIMEOUT)
        .await
        .context("signed in but the gate never redirected")
}
