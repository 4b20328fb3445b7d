//! User and email records.

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ManageError, ManageResult};
use crate::otp::TotpSecret;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 50;

#[allow(clippy::expect_used)]
static VALID_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$").expect("valid regex literal")
});

/// User record.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub password_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub totp_secret: Option<TotpSecret>,
    pub emails: Vec<Email>,
}

/// An email address attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub email: String,
    pub primary: bool,
    pub verified: bool,
}

impl Email {
    /// Create an unverified, non-primary address.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            primary: false,
            verified: false,
        }
    }

    /// Mark as the primary address.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Mark as verified.
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }
}

impl User {
    /// Build a new active user with a hashed password.
    pub fn new(username: &str, name: &str, password: &str) -> ManageResult<Self> {
        validate_username(username)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::now_v7(),
            username: username.to_string(),
            name: name.to_string(),
            password: hash_password(password)?,
            password_date: Some(now),
            is_active: true,
            is_superuser: false,
            date_joined: now,
            last_login: now,
            totp_secret: None,
            emails: Vec::new(),
        })
    }

    /// The primary email record, if one is set.
    pub fn primary_email(&self) -> Option<&Email> {
        self.emails.iter().find(|e| e.primary)
    }

    /// The primary email address, if one is set.
    pub fn email(&self) -> Option<&str> {
        self.primary_email().map(|e| e.email.as_str())
    }

    /// Whether a second factor is configured.
    pub fn has_two_factor(&self) -> bool {
        self.totp_secret.is_some()
    }

    /// Two-factor setup requires a verified primary address to recover with.
    pub fn two_factor_provisioning_allowed(&self) -> bool {
        self.primary_email().is_some_and(|e| e.verified)
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.password.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.password) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Replace the password hash.
    pub fn set_password(&mut self, password: &str) -> ManageResult<()> {
        self.password = hash_password(password)?;
        self.password_date = Some(Utc::now());
        Ok(())
    }
}

/// Check a username against the allowed length and character rules.
pub fn validate_username(username: &str) -> ManageResult<()> {
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ManageError::InvalidUsername(format!(
            "must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !VALID_USERNAME.is_match(username) {
        return Err(ManageError::InvalidUsername(format!(
            "'{username}' must start and end with a letter or digit and contain only letters, digits, '.', '_' or '-'"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> ManageResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ManageError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let user = User::new("alice", "Alice", "test_password_123").unwrap();

        assert!(user.password.starts_with("$argon2"));
        assert!(user.verify_password("test_password_123"));
        assert!(!user.verify_password("wrong_password"));
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("a").is_ok());
        assert!(validate_username("Jane.Doe-99_x").is_ok());
        assert!(validate_username("-leading").is_err());
        assert!(validate_username("trailing.").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
        assert!(validate_username(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_two_factor_flags() {
        let mut user = User::new("bob", "Bob", "correct horse").unwrap();
        assert!(!user.has_two_factor());
        assert!(!user.two_factor_provisioning_allowed());

        user.emails.push(Email::new("bob@example.com").primary());
        assert_eq!(user.email(), Some("bob@example.com"));
        assert!(!user.two_factor_provisioning_allowed());

        user.emails[0].verified = true;
        assert!(user.two_factor_provisioning_allowed());

        user.totp_secret = Some(TotpSecret::generate());
        assert!(user.has_two_factor());
    }

    #[test]
    fn test_serialization_hides_secrets() {
        let user = User::new("carol", "Carol", "pw-pw-pw-pw").unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("totp_secret").is_none());
        assert_eq!(json["username"], "carol");
    }
}
