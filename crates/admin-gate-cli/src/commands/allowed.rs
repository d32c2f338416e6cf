//! Domain allow-list check.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use gate_config_and_utils::Config;
use serde::Serialize;
use session_gate::DomainAuthorizer;
use std::fmt;

#[derive(Debug, Serialize)]
struct AllowDecision {
    email: String,
    allowed: bool,
    domains: Vec<String>,
}

impl fmt::Display for AllowDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "allowed" } else { "not allowed" };
        writeln!(f, "{} is {}", self.email, verdict)?;
        write!(f, "Allowed domains: {}", self.domains.join(", "))
    }
}

fn decide(authorizer: &DomainAuthorizer, email: &str) -> AllowDecision {
    AllowDecision {
        email: email.to_string(),
        allowed: authorizer.is_allowed(Some(email)),
        domains: authorizer.domains().to_vec(),
    }
}

/// Report whether an email may sign in.
pub fn allowed(config: &Config, email: &str, format: &OutputFormat) -> Result<()> {
    let decision = decide(&DomainAuthorizer::from_config(config), email);
    output::print(&decision, format);
    Ok(())
}
