//! Session gating for the admin pages.
//!
//! This crate provides:
//! - A per-page session cache in front of the auth service
//! - An email domain allow-list
//! - Authenticated fetch that attaches bearer credentials to `/api/` calls
//! - An FSM-based navigation guard reacting to page loads and auth events
//! - The OTP login form controller with a resend cooldown
//! - A Supabase-backed auth service and data store

mod auth_service;
mod cooldown;
mod domains;
mod error;
mod guard;
mod guard_fsm;
mod interceptor;
mod location;
mod login_page;
mod page;
mod redirect;
mod session;
mod signout;
mod supabase_client;
mod transport;
mod types;

#[cfg(test)]
mod tests;

pub use auth_service::{AuthService, DataStore, OtpChannel, OtpRequest, VerifyOtpRequest};
pub use cooldown::{CooldownTimer, ResendCooldown, DEFAULT_COOLDOWN_SECS};
pub use domains::{DomainAuthorizer, BUILTIN_ALLOWED_DOMAINS};
pub use error::{AuthError, AuthResult};
pub use guard::{
    reduce, GuardEffect, GuardEvent, GuardPolicy, NavigationGuard, PageKind, LOGIN_AUDIT_TABLE,
};
pub use guard_fsm::guard_machine;
pub use guard_fsm::{GuardMachine, GuardMachineInput, GuardMachineState, GuardState};
pub use interceptor::{classify, CredentialPolicy, FetchInterceptor, PROTECTED_PREFIX};
pub use location::{Navigator, PageLocation};
pub use login_page::{config_error_status, LoginPage, StatusLine};
pub use page::{on_missing_config, GateSettings, PageContext, PageDeps};
pub use redirect::{RedirectPolicy, DEFAULT_DESTINATION, DEFAULT_LOGIN_PATH, REDIRECT_PARAM};
pub use session::SessionOracle;
pub use signout::sign_out_and_return;
pub use supabase_client::SupabaseAuthClient;
pub use transport::{
    HttpResponse, HttpTransport, OutgoingRequest, ReqwestTransport, RequestInit, RequestTarget,
    StructuredRequest,
};
pub use types::{AuthEvent, AuthEventKind, Session, User};
