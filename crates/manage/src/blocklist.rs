//! Email domains that cannot be attached to an account.

use std::collections::HashSet;

use crate::config::Config;

/// Disposable-mail domains rejected out of the box.
const BUILTIN_DOMAINS: &[&str] = &[
    "0-mail.com",
    "10minutemail.com",
    "bearsarefuzzy.com",
    "discard.email",
    "dispostable.com",
    "guerrillamail.com",
    "mailinator.com",
    "sharklasers.com",
    "spam4.me",
    "temp-mail.org",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
];

/// Set of blocked email domains, compared case-insensitively.
#[derive(Debug, Clone)]
pub struct DomainBlocklist {
    domains: HashSet<String>,
}

impl Default for DomainBlocklist {
    fn default() -> Self {
        Self {
            domains: BUILTIN_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl DomainBlocklist {
    /// An empty blocklist.
    pub fn empty() -> Self {
        Self {
            domains: HashSet::new(),
        }
    }

    /// Built-in domains plus any configured extras.
    pub fn from_config(config: &Config) -> Self {
        Self::default().with_domains(config.blocked_email_domains.iter().map(String::as_str))
    }

    /// Add domains.
    pub fn with_domains<'a>(mut self, domains: impl IntoIterator<Item = &'a str>) -> Self {
        self.domains
            .extend(domains.into_iter().map(|d| d.trim().to_lowercase()));
        self
    }

    /// Whether the domain is blocked.
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.domains.contains(&domain.trim().to_lowercase())
    }

    /// Whether the domain part of an address, after its last `@`, is blocked.
    pub fn is_blocked_email(&self, email: &str) -> bool {
        email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| self.is_blocked(domain))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_domains() {
        let list = DomainBlocklist::default();
        assert!(list.is_blocked_email("foo@bearsarefuzzy.com"));
        assert!(list.is_blocked_email("foo@BearsAreFuzzy.COM"));
        assert!(!list.is_blocked_email("foo@bar.com"));
        assert!(!list.is_blocked_email("no-at-sign"));
    }

    #[test]
    fn test_last_at_sign_decides_domain() {
        let list = DomainBlocklist::default();
        assert!(list.is_blocked_email("\"odd@bar.com\"@mailinator.com"));
        assert!(!list.is_blocked_email("x@mailinator.com@bar.com"));
    }

    #[test]
    fn test_configured_domains() {
        let config = Config {
            blocked_email_domains: vec!["spam.example".to_string()],
            ..Config::default()
        };
        let list = DomainBlocklist::from_config(&config);
        assert!(list.is_blocked("spam.example"));
        assert!(list.is_blocked("yopmail.com"));
        assert!(!DomainBlocklist::empty().is_blocked("yopmail.com"));
    }
}
