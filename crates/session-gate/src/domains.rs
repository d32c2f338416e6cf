//! Email domain allow-list.

use gate_config_and_utils::{Config, DomainList};

/// Domains that are always allowed, whatever the configuration says.
pub const BUILTIN_ALLOWED_DOMAINS: [&str; 3] = ["ri.edu.sg", "schools.gov.sg", "ufinity.com"];

/// Case-insensitive email domain allow-list.
///
/// Entries are lowercase, trimmed, deduplicated in first-seen order, and never
/// empty (the built-ins are always present). Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAuthorizer {
    domains: Vec<String>,
}

impl DomainAuthorizer {
    /// Build the allow-list: configured list, then primary domain, then built-ins.
    pub fn new(allowed: Option<&DomainList>, primary: Option<&str>) -> Self {
        let candidates = normalize_domain_list(allowed)
            .into_iter()
            .chain(primary.map(String::from))
            .chain(BUILTIN_ALLOWED_DOMAINS.iter().map(|d| d.to_string()));

        let mut domains: Vec<String> = Vec::new();
        for candidate in candidates {
            let domain = candidate.trim().to_lowercase();
            if !domain.is_empty() && !domains.contains(&domain) {
                domains.push(domain);
            }
        }

        Self { domains }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.admin_allowed_domains.as_ref(),
            config.admin_domain.as_deref(),
        )
    }

    /// Whether the email ends in `@<domain>` for any allowed domain.
    pub fn is_allowed(&self, email: Option<&str>) -> bool {
        let email = email.unwrap_or_default().trim().to_lowercase();
        if email.is_empty() {
            return false;
        }
        self.domains
            .iter()
            .any(|domain| email.ends_with(&format!("@{}", domain)))
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Human-readable domain list, e.g. `ri.edu.sg, schools.gov.sg`.
    pub fn label(&self) -> String {
        self.domains.join(", ")
    }

    /// Message shown when an email is rejected.
    pub fn rejection_message(&self) -> String {
        format!("Only {} emails are allowed.", self.label())
    }
}

/// A list stays a list, a non-blank string becomes a singleton, anything else is empty.
fn normalize_domain_list(input: Option<&DomainList>) -> Vec<String> {
    match input {
        Some(DomainList::Many(list)) => list.clone(),
        Some(DomainList::One(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => Vec::new(),
    }
}
