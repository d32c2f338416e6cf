//! Where to send a visitor before and after signing in.

use crate::location::PageLocation;
use crate::types::User;
use gate_config_and_utils::Config;
use url::Url;

pub const DEFAULT_LOGIN_PATH: &str = "/login.html";
pub const DEFAULT_DESTINATION: &str = "/admin";
/// Query parameter carrying the page to return to after signing in.
pub const REDIRECT_PARAM: &str = "redirect";

/// Redirect targets for the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub login_path: String,
    pub default_destination: String,
    /// Destination for a user's very first sign-in.
    pub first_login_destination: Option<String>,
    /// Callback URL for OTP emails, overriding the computed one.
    pub email_redirect_override: Option<String>,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_destination: DEFAULT_DESTINATION.to_string(),
            first_login_destination: None,
            email_redirect_override: None,
        }
    }
}

impl RedirectPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            first_login_destination: non_blank(config.admin_first_login_redirect.as_deref()),
            email_redirect_override: non_blank(config.admin_email_redirect_to.as_deref()),
            ..Self::default()
        }
    }

    /// Explicit `redirect` query parameter, else the default destination.
    pub fn resolve_destination(&self, location: &PageLocation) -> String {
        location
            .query_param(REDIRECT_PARAM)
            .filter(|target| !target.is_empty())
            .unwrap_or_else(|| self.default_destination.clone())
    }

    /// Destination right after a successful sign-in.
    ///
    /// A configured first-login destination wins when the user looks like a
    /// first-time sign-in; see [`User::looks_like_first_sign_in`] for the
    /// (approximate) rule.
    pub fn post_sign_in_destination(&self, location: &PageLocation, user: &User) -> String {
        match &self.first_login_destination {
            Some(first) if user.looks_like_first_sign_in() => first.clone(),
            _ => self.resolve_destination(location),
        }
    }

    /// Login page URL that returns to the current page afterwards.
    pub fn login_url(&self, location: &PageLocation) -> String {
        self.login_url_returning_to(&location.relative())
    }

    /// Login page URL used after an explicit sign-out.
    pub fn sign_out_url(&self) -> String {
        self.login_url_returning_to(&self.default_destination)
    }

    fn login_url_returning_to(&self, target: &str) -> String {
        format!(
            "{}?{}={}",
            self.login_path,
            REDIRECT_PARAM,
            urlencoding::encode(target)
        )
    }

    /// Absolute callback URL embedded in OTP emails.
    pub fn email_redirect_to(&self, location: &PageLocation) -> String {
        let target = self
            .email_redirect_override
            .clone()
            .or_else(|| self.first_login_destination.clone())
            .unwrap_or_else(|| self.resolve_destination(location));

        let origin = location.origin();
        Url::parse(&origin)
            .and_then(|base| base.join(&target))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}{}", origin, DEFAULT_DESTINATION))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
