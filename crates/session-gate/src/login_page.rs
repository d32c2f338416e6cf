//! OTP login form controller.
//!
//! Each action updates the page's status line and returns the final status.
//! Redirecting after a successful verification is left to the navigation
//! guard, which sees the resulting `SignedIn` event.

use crate::auth_service::{AuthService, OtpChannel, OtpRequest, VerifyOtpRequest};
use crate::cooldown::{CooldownTimer, DEFAULT_COOLDOWN_SECS};
use crate::domains::DomainAuthorizer;
use crate::location::Navigator;
use crate::redirect::RedirectPolicy;
use crate::types::Session;
use crate::AuthError;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// The login page's three status slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub message: String,
    pub error: String,
    pub success: String,
}

impl StatusLine {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: text.into(),
            ..Self::default()
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: text.into(),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Human-readable text for a failed auth call.
fn failure_text(err: &AuthError, fallback: &str) -> String {
    let text = match err {
        AuthError::Remote(msg) => msg.clone(),
        other => other.to_string(),
    };
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// Status shown when the page cannot start because configuration is missing.
pub fn config_error_status(err: &AuthError) -> StatusLine {
    StatusLine::error(format!(
        "Missing Supabase config. Set SUPABASE_URL and SUPABASE_ANON_KEY. ({})",
        err
    ))
}

/// Controller behind the email + OTP form.
pub struct LoginPage {
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    authorizer: DomainAuthorizer,
    redirects: RedirectPolicy,
    cooldown: CooldownTimer,
    cooldown_units: u32,
    remembered_email: Mutex<Option<String>>,
    otp_step_visible: Mutex<bool>,
    status: Mutex<StatusLine>,
}

impl LoginPage {
    pub fn new(
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        authorizer: DomainAuthorizer,
        redirects: RedirectPolicy,
    ) -> Self {
        Self {
            auth,
            navigator,
            authorizer,
            redirects,
            cooldown: CooldownTimer::default(),
            cooldown_units: DEFAULT_COOLDOWN_SECS,
            remembered_email: Mutex::new(None),
            otp_step_visible: Mutex::new(false),
            status: Mutex::new(StatusLine::default()),
        }
    }

    /// Replace the resend cooldown (tick period and length).
    pub fn with_cooldown(mut self, timer: CooldownTimer, units: u32) -> Self {
        self.cooldown = timer;
        self.cooldown_units = units;
        self
    }

    pub fn status(&self) -> StatusLine {
        self.status.lock().clone()
    }

    pub fn otp_step_visible(&self) -> bool {
        *self.otp_step_visible.lock()
    }

    pub fn remembered_email(&self) -> Option<String> {
        self.remembered_email.lock().clone()
    }

    pub fn resend_enabled(&self) -> bool {
        self.cooldown.is_enabled()
    }

    pub fn resend_label(&self) -> String {
        self.cooldown.label()
    }

    /// Callback URL embedded in OTP emails sent from this page.
    pub fn email_redirect_to(&self) -> String {
        self.redirects.email_redirect_to(&self.navigator.location())
    }

    fn set_status(&self, status: StatusLine) -> StatusLine {
        *self.status.lock() = status.clone();
        status
    }

    /// Explicit email, else the one remembered from the last send.
    fn effective_email(&self, email: Option<&str>) -> String {
        email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from)
            .or_else(|| self.remembered_email())
            .unwrap_or_default()
    }

    fn otp_request(&self, email: &str) -> OtpRequest {
        OtpRequest {
            email: email.to_string(),
            create_user: true,
            redirect_to: Some(self.email_redirect_to()),
        }
    }

    /// Error from the URL fragment after a failed magic-link visit.
    pub fn initial_status(&self) -> StatusLine {
        let location = self.navigator.location();
        let status = location
            .fragment_param("error_description")
            .or_else(|| location.fragment_param("error"))
            .filter(|e| !e.is_empty())
            .map(StatusLine::error)
            .unwrap_or_default();
        self.set_status(status)
    }

    pub fn signed_in_status(session: &Session) -> StatusLine {
        StatusLine::success(format!("Signed in as {}", session.email().unwrap_or_default()))
    }

    /// Show who is signed in, if anyone.
    pub async fn refresh_session_status(&self) -> StatusLine {
        match self.auth.get_session().await {
            Ok(Some(session)) => {
                *self.otp_step_visible.lock() = false;
                self.set_status(Self::signed_in_status(&session))
            }
            Ok(None) => self.status(),
            Err(e) => {
                debug!(error = %e, "Could not read session for status line");
                self.status()
            }
        }
    }

    /// Send a one-time code and start the resend cooldown.
    pub async fn send_code(&self, email: &str) -> StatusLine {
        self.set_status(StatusLine::message("Sending code…"));
        let email = email.trim();
        if !self.authorizer.is_allowed(Some(email)) {
            return self.set_status(StatusLine::error(self.authorizer.rejection_message()));
        }

        match self.auth.sign_in_with_otp(&self.otp_request(email)).await {
            Ok(()) => {
                info!(email = %email, "OTP sent");
                *self.remembered_email.lock() = Some(email.to_string());
                *self.otp_step_visible.lock() = true;
                self.cooldown.start(self.cooldown_units);
                self.set_status(StatusLine::success("OTP sent. Check your inbox."))
            }
            Err(e) => self.set_status(StatusLine::error(failure_text(&e, "Failed to send OTP"))),
        }
    }

    /// Send another code, falling back to the remembered email.
    pub async fn resend_code(&self, email: Option<&str>) -> StatusLine {
        let email = self.effective_email(email);
        if !self.authorizer.is_allowed(Some(&email)) {
            return self.set_status(StatusLine::error(self.authorizer.rejection_message()));
        }

        self.set_status(StatusLine::message("Resending code…"));
        match self.auth.sign_in_with_otp(&self.otp_request(&email)).await {
            Ok(()) => {
                info!(email = %email, "OTP resent");
                self.cooldown.start(self.cooldown_units);
                self.set_status(StatusLine::success("OTP resent. Check your inbox."))
            }
            Err(e) => {
                self.cooldown.stop();
                self.set_status(StatusLine::error(failure_text(&e, "Failed to resend OTP")))
            }
        }
    }

    /// Exchange the code for a session.
    pub async fn verify(&self, email: Option<&str>, token: &str) -> StatusLine {
        self.set_status(StatusLine::message("Verifying…"));
        let email = self.effective_email(email);
        let token = token.trim();

        if !self.authorizer.is_allowed(Some(&email)) {
            return self.set_status(StatusLine::error(self.authorizer.rejection_message()));
        }
        if token.is_empty() {
            return self.set_status(StatusLine::error("Enter the OTP code sent to your email."));
        }

        let request = VerifyOtpRequest {
            email,
            token: token.to_string(),
            channel: OtpChannel::Email,
        };
        match self.auth.verify_otp(&request).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "OTP verified");
                self.set_status(StatusLine::success("Signed in successfully."))
            }
            Err(e) => self.set_status(StatusLine::error(failure_text(&e, "Verification failed"))),
        }
    }

    pub async fn sign_out(&self) -> StatusLine {
        self.set_status(StatusLine::message("Signing out…"));
        match self.auth.sign_out().await {
            Ok(()) => {
                *self.otp_step_visible.lock() = false;
                self.set_status(StatusLine::success("Signed out."))
            }
            Err(e) => self.set_status(StatusLine::error(failure_text(&e, "Sign out failed"))),
        }
    }
}
