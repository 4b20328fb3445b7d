//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Account management configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Extra email domains rejected by the add-email form, on top of the
    /// built-in disposable domain list.
    pub blocked_email_domains: Vec<String>,

    /// Minimum length for new passwords (default: 8).
    pub password_min_length: usize,

    /// Issuer name shown by authenticator apps (default: "Package Index").
    pub totp_issuer: String,

    /// Number of 30-second steps accepted either side of now (default: 1).
    pub totp_valid_window: u32,

    /// Base URL of the Pwned Passwords range API.
    pub hibp_api_url: String,

    /// Timeout for breach lookups (default: 2000ms).
    pub hibp_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blocked_email_domains: Vec::new(),
            password_min_length: 8,
            totp_issuer: "Package Index".to_string(),
            totp_valid_window: 1,
            hibp_api_url: "https://api.pwnedpasswords.com".to_string(),
            hibp_timeout: Duration::from_millis(2000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let blocked_email_domains = lookup("BLOCKED_EMAIL_DOMAINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let password_min_length = lookup("PASSWORD_MIN_LENGTH")
            .unwrap_or_else(|| defaults.password_min_length.to_string())
            .parse()
            .context("PASSWORD_MIN_LENGTH must be a valid usize")?;

        let totp_issuer = lookup("TOTP_ISSUER").unwrap_or(defaults.totp_issuer);

        let totp_valid_window = lookup("TOTP_VALID_WINDOW")
            .unwrap_or_else(|| defaults.totp_valid_window.to_string())
            .parse()
            .context("TOTP_VALID_WINDOW must be a valid u32")?;

        let hibp_api_url = lookup("HIBP_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.hibp_api_url);

        let hibp_timeout_ms: u64 = lookup("HIBP_TIMEOUT_MS")
            .unwrap_or_else(|| "2000".to_string())
            .parse()
            .context("HIBP_TIMEOUT_MS must be a valid u64")?;

        Ok(Self {
            blocked_email_domains,
            password_min_length,
            totp_issuer,
            totp_valid_window,
            hibp_api_url,
            hibp_timeout: Duration::from_millis(hibp_timeout_ms),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(config.blocked_email_domains.is_empty());
        assert_eq!(config.password_min_length, 8);
        assert_eq!(config.totp_issuer, "Package Index");
        assert_eq!(config.totp_valid_window, 1);
        assert_eq!(config.hibp_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BLOCKED_EMAIL_DOMAINS", " Spam.example , ,junk.test"),
            ("PASSWORD_MIN_LENGTH", "12"),
            ("TOTP_ISSUER", "Test Index"),
            ("HIBP_API_URL", "http://localhost:9000/"),
            ("HIBP_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(
            config.blocked_email_domains,
            vec!["spam.example".to_string(), "junk.test".to_string()]
        );
        assert_eq!(config.password_min_length, 12);
        assert_eq!(config.totp_issuer, "Test Index");
        assert_eq!(config.hibp_api_url, "http://localhost:9000");
        assert_eq!(config.hibp_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("TOTP_VALID_WINDOW", "wide")])).unwrap_err();
        assert!(err.to_string().contains("TOTP_VALID_WINDOW"));
    }
}
