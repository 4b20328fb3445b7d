//! Breached password checks.
//!
//! The Pwned Passwords range API takes the first five hex characters of a
//! password's SHA-1 and answers with every known suffix under that prefix,
//! so the password itself never leaves the process.

use std::time::Duration;

use reqwest::blocking::Client;
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ManageResult;

/// Message shown when a new password is found in a breach corpus.
pub const BREACHED_PASSWORD_MESSAGE: &str = "This password appears in a security breach or has been \
     compromised and cannot be used. Choose a different password.";

/// Length of the hash prefix sent to the range API.
const PREFIX_LENGTH: usize = 5;

/// Checks passwords against known compromised-password datasets.
#[cfg_attr(test, mockall::automock)]
pub trait BreachService: Send + Sync {
    /// Whether the password is known to be compromised.
    fn check_password(&self, password: &str) -> ManageResult<bool>;

    /// Message to show the user when `check_password` returns true.
    fn failure_message(&self) -> String;
}

/// Pwned Passwords range API client.
#[derive(Debug, Clone)]
pub struct HibpBreachService {
    client: Client,
    api_url: String,
}

impl HibpBreachService {
    /// Create a client for the range API at `api_url`.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> ManageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pkgindex-manage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> ManageResult<Self> {
        Self::new(config.hibp_api_url.clone(), config.hibp_timeout)
    }

    fn fetch_range(&self, prefix: &str) -> Option<String> {
        let url = format!("{}/range/{prefix}", self.api_url);

        let response = match self.client.get(&url).header("Add-Padding", "true").send() {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "breach lookup failed, allowing password");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "breach lookup returned an error, allowing password");
            return None;
        }

        match response.text() {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(error = %e, "failed to read breach lookup response, allowing password");
                None
            }
        }
    }
}

impl BreachService for HibpBreachService {
    fn check_password(&self, password: &str) -> ManageResult<bool> {
        let (prefix, suffix) = split_hash(password);

        // Lookups fail open: an unreachable API must not block password changes.
        let Some(body) = self.fetch_range(&prefix) else {
            return Ok(false);
        };

        let breached = range_contains(&body, &suffix);
        debug!(breached, "breach lookup completed");
        Ok(breached)
    }

    fn failure_message(&self) -> String {
        BREACHED_PASSWORD_MESSAGE.to_string()
    }
}

/// Breach service that never reports a breach.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBreachService;

impl BreachService for NullBreachService {
    fn check_password(&self, _password: &str) -> ManageResult<bool> {
        Ok(false)
    }

    fn failure_message(&self) -> String {
        BREACHED_PASSWORD_MESSAGE.to_string()
    }
}

/// Split the uppercase hex SHA-1 of a password into range prefix and suffix.
pub fn split_hash(password: &str) -> (String, String) {
    let hash = hex::encode_upper(Sha1::digest(password.as_bytes()));
    let (prefix, suffix) = hash.split_at(PREFIX_LENGTH);
    (prefix.to_string(), suffix.to_string())
}

/// Whether a range response lists `suffix` with a non-zero count.
///
/// Padding entries carry a count of zero and never match.
pub fn range_contains(body: &str, suffix: &str) -> bool {
    body.lines().any(|line| {
        let Some((candidate, count)) = line.trim().split_once(':') else {
            return false;
        };
        candidate.eq_ignore_ascii_case(suffix)
            && count.trim().parse::<u64>().is_ok_and(|count| count > 0)
    })
}
