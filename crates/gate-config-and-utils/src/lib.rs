//! Configuration, error types, and logging shared by the admin gate crates.

mod config;
mod error;
mod logging;

pub use config::{
    parse_domain_list, Config, DomainList, ServiceCredentials, DEFAULT_LOG_LEVEL,
    ENV_ADMIN_ALLOWED_DOMAINS, ENV_ADMIN_DOMAIN, ENV_ADMIN_EMAIL_REDIRECT_TO,
    ENV_ADMIN_FIRST_LOGIN_REDIRECT, ENV_LOG_LEVEL, ENV_SUPABASE_ANON_KEY,
    ENV_SUPABASE_SERVICE_ROLE_KEY, ENV_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{
    init_logging, init_logging_for_service, parse_level, LogFormat, ENV_LOG_FORMAT,
};
