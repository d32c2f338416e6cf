//! Authentication and gating error types.

use gate_config_and_utils::CoreError;
use thiserror::Error;

/// Error type for session gating operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Required configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// No valid session (or a session without an access token)
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Session exists but the email is not on the allow-list
    #[error("Email not allowed: {0}")]
    Unauthorized(String),

    /// Auth service or data store rejected the call
    #[error("Remote error: {0}")]
    Remote(String),

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Invalid state transition in the guard FSM
    #[error("Invalid guard state transition: {0}")]
    InvalidStateTransition(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(msg) => AuthError::Config(msg),
            other => AuthError::Config(other.to_string()),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_maps_message() {
        let err: AuthError = CoreError::Config("SUPABASE_URL is not set".to_string()).into();
        assert!(matches!(err, AuthError::Config(ref msg) if msg == "SUPABASE_URL is not set"));
    }

    #[test]
    fn test_unauthorized_names_email() {
        let err = AuthError::Unauthorized("t@gmail.com".to_string());
        assert_eq!(err.to_string(), "Email not allowed: t@gmail.com");
    }
}
