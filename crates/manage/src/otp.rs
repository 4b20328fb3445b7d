//! Time-based one-time passwords (RFC 6238).
//!
//! Secrets are 20 random bytes, shown to users as unpadded base32. Codes are
//! six digits over 30-second steps, and verification accepts a small window
//! of steps around the current time to absorb clock drift.

use std::fmt;

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{ManageError, ManageResult};

/// Number of digits in a code.
pub const TOTP_LENGTH: u32 = 6;

/// Step length in seconds.
pub const TOTP_INTERVAL: u64 = 30;

/// Secret length in bytes.
pub const SECRET_LENGTH: usize = 20;

/// Shared TOTP secret.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpSecret(Vec<u8>);

impl TotpSecret {
    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SECRET_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a base32 secret. Case, spaces and padding are ignored.
    pub fn from_base32(encoded: &str) -> ManageResult<Self> {
        let normalized: String = encoded
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '=')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(ManageError::InvalidSecret("empty secret".to_string()));
        }

        BASE32_NOPAD
            .decode(normalized.as_bytes())
            .map(Self)
            .map_err(|e| ManageError::InvalidSecret(e.to_string()))
    }

    /// Unpadded base32 form, as entered into authenticator apps.
    pub fn to_base32(&self) -> String {
        BASE32_NOPAD.encode(&self.0)
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TotpSecret(..)")
    }
}

/// HMAC algorithm used to derive codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

impl Algorithm {
    /// Name used in provisioning URIs.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Sha1 => "SHA1",
            Algorithm::Sha256 => "SHA256",
        }
    }
}

/// Checks a submitted code against a secret.
#[cfg_attr(test, mockall::automock)]
pub trait TotpVerifier: Send + Sync {
    /// Whether `code` is currently valid for `secret`.
    fn verify(&self, code: &str, secret: &TotpSecret) -> bool;
}

/// RFC 6238 code generator and verifier.
#[derive(Debug, Clone)]
pub struct Totp {
    digits: u32,
    step: u64,
    algorithm: Algorithm,
    window: u32,
}

impl Default for Totp {
    fn default() -> Self {
        Self {
            digits: TOTP_LENGTH,
            step: TOTP_INTERVAL,
            algorithm: Algorithm::Sha1,
            window: 1,
        }
    }
}

impl Totp {
    /// Six digits, 30-second steps, SHA-1, one step of tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the configured validation window.
    pub fn from_config(config: &Config) -> Self {
        Self::default().with_window(config.totp_valid_window)
    }

    /// Set how many steps either side of now are accepted.
    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    /// Set the HMAC algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the code length.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Code for the step containing `unix_time`.
    pub fn generate_at(&self, secret: &TotpSecret, unix_time: u64) -> ManageResult<String> {
        self.code_for_counter(secret, unix_time / self.step)
    }

    /// Code for the current time.
    pub fn generate_now(&self, secret: &TotpSecret) -> ManageResult<String> {
        self.generate_at(secret, now_unix())
    }

    /// Whether `code` matches any step within the window around `unix_time`.
    pub fn verify_at(&self, code: &str, secret: &TotpSecret, unix_time: u64) -> bool {
        let code = code.trim();
        if code.len() != self.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let current = unix_time / self.step;
        let first = current.saturating_sub(u64::from(self.window));
        let last = current.saturating_add(u64::from(self.window));

        let mut matched = false;
        for counter in first..=last {
            let Ok(expected) = self.code_for_counter(secret, counter) else {
                return false;
            };
            // Check every step so timing does not reveal which one matched.
            matched |= bool::from(expected.as_bytes().ct_eq(code.as_bytes()));
        }
        matched
    }

    /// `otpauth://` URI for enrolling `secret` in an authenticator app.
    pub fn provisioning_uri(&self, secret: &TotpSecret, username: &str, issuer: &str) -> String {
        let issuer = urlencoding::encode(issuer);
        let username = urlencoding::encode(username);
        format!(
            "otpauth://totp/{issuer}:{username}?secret={secret}&issuer={issuer}&algorithm={algorithm}&digits={digits}&period={period}",
            secret = secret.to_base32(),
            algorithm = self.algorithm.name(),
            digits = self.digits,
            period = self.step,
        )
    }

    fn code_for_counter(&self, secret: &TotpSecret, counter: u64) -> ManageResult<String> {
        let message = counter.to_be_bytes();
        let digest = match self.algorithm {
            Algorithm::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
                    .map_err(|e| ManageError::InvalidSecret(e.to_string()))?;
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
                    .map_err(|e| ManageError::InvalidSecret(e.to_string()))?;
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
        };

        // Dynamic truncation, RFC 4226 section 5.3.
        let offset = usize::from(digest[digest.len() - 1] & 0x0f);
        let binary = (u32::from(digest[offset] & 0x7f) << 24)
            | (u32::from(digest[offset + 1]) << 16)
            | (u32::from(digest[offset + 2]) << 8)
            | u32::from(digest[offset + 3]);
        let code = u64::from(binary) % 10u64.pow(self.digits);

        Ok(format!("{code:0width$}", width = self.digits as usize))
    }
}

impl TotpVerifier for Totp {
    fn verify(&self, code: &str, secret: &TotpSecret) -> bool {
        self.verify_at(code, secret, now_unix())
    }
}

fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
