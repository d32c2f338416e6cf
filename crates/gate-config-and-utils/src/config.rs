//! Configuration management for the admin gate.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_ADMIN_DOMAIN: &str = "ADMIN_DOMAIN";
pub const ENV_ADMIN_ALLOWED_DOMAINS: &str = "ADMIN_ALLOWED_DOMAINS";
pub const ENV_ADMIN_FIRST_LOGIN_REDIRECT: &str = "ADMIN_FIRST_LOGIN_REDIRECT";
pub const ENV_ADMIN_EMAIL_REDIRECT_TO: &str = "ADMIN_EMAIL_REDIRECT_TO";
pub const ENV_LOG_LEVEL: &str = "ADMIN_GATE_LOG_LEVEL";

/// Additional allowed email domains, given either as one string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainList {
    Many(Vec<String>),
    One(String),
}

/// Parsed auth service endpoint and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub url: Url,
    pub key: String,
}

/// Admin gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default)]
    pub auth_service_url: Option<String>,
    /// Supabase anon (publishable) key used by browser-side flows.
    #[serde(default)]
    pub auth_service_key: Option<String>,
    /// Supabase service role key used by server-side record helpers.
    #[serde(default)]
    pub service_role_key: Option<String>,
    /// Primary allow-listed email domain.
    #[serde(default)]
    pub admin_domain: Option<String>,
    /// Additional allow-listed email domains.
    #[serde(default)]
    pub admin_allowed_domains: Option<DomainList>,
    /// Destination for a user's very first sign-in.
    #[serde(default)]
    pub admin_first_login_redirect: Option<String>,
    /// Override for the callback URL embedded in OTP emails.
    #[serde(default)]
    pub admin_email_redirect_to: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            auth_service_url: None,
            auth_service_key: None,
            service_role_key: None,
            admin_domain: None,
            admin_allowed_domains: None,
            admin_first_login_redirect: None,
            admin_email_redirect_to: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific JSON file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override configuration from process environment variables.
    pub fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Override configuration from an arbitrary variable lookup.
    ///
    /// Blank values are ignored so an exported-but-empty variable never
    /// clears a value loaded from file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(url) = get(ENV_SUPABASE_URL) {
            self.auth_service_url = Some(url);
        }
        if let Some(key) = get(ENV_SUPABASE_ANON_KEY) {
            self.auth_service_key = Some(key);
        }
        if let Some(key) = get(ENV_SUPABASE_SERVICE_ROLE_KEY) {
            self.service_role_key = Some(key);
        }
        if let Some(domain) = get(ENV_ADMIN_DOMAIN) {
            self.admin_domain = Some(domain);
        }
        if let Some(domains) = get(ENV_ADMIN_ALLOWED_DOMAINS) {
            self.admin_allowed_domains = Some(parse_domain_list(&domains));
        }
        if let Some(path) = get(ENV_ADMIN_FIRST_LOGIN_REDIRECT) {
            self.admin_first_login_redirect = Some(path);
        }
        if let Some(target) = get(ENV_ADMIN_EMAIL_REDIRECT_TO) {
            self.admin_email_redirect_to = Some(target);
        }
    }

    /// Auth service URL and anon key, required by every login/guard flow.
    pub fn require_auth_service(&self) -> CoreResult<ServiceCredentials> {
        self.credentials(self.auth_service_key.as_deref(), ENV_SUPABASE_ANON_KEY)
    }

    /// Auth service URL and service role key, required by server-side record helpers.
    pub fn require_service_role(&self) -> CoreResult<ServiceCredentials> {
        self.credentials(
            self.service_role_key.as_deref(),
            ENV_SUPABASE_SERVICE_ROLE_KEY,
        )
    }

    fn credentials(&self, key: Option<&str>, key_name: &str) -> CoreResult<ServiceCredentials> {
        let raw_url = self
            .auth_service_url
            .as_deref()
            .and_then(|value| non_empty(value.to_string()))
            .ok_or_else(|| {
                CoreError::Config(format!("{} is not set", ENV_SUPABASE_URL))
            })?;
        let key = key
            .and_then(|value| non_empty(value.to_string()))
            .ok_or_else(|| CoreError::Config(format!("{} is not set", key_name)))?;

        Ok(ServiceCredentials {
            url: Url::parse(&raw_url)?,
            key,
        })
    }
}

/// Parse an allowed-domains value: a JSON array, a comma-separated list, or one domain.
pub fn parse_domain_list(raw: &str) -> DomainList {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return DomainList::Many(list);
        }
    }
    if trimmed.contains(',') {
        return DomainList::Many(trimmed.split(',').map(|d| d.trim().to_string()).collect());
    }
    DomainList::One(trimmed.to_string())
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
