//! pkgindex test utilities.
//!
//! Stub collaborators that record how they were called, plus small
//! fixtures and assertion helpers for exercising the account forms.

use std::collections::HashMap;

use parking_lot::Mutex;
use pkgindex_manage::ManageResult;
use pkgindex_manage::form::FormData;
use pkgindex_manage::otp::{TotpSecret, TotpVerifier};
use pkgindex_manage::services::{BreachService, UserService};
use uuid::Uuid;

/// A call made to one of the stub collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindUserid(String),
    FindUseridByEmail(String),
    CheckPassword(Uuid, String),
    CheckBreach(String),
    VerifyTotp(String),
}

/// User service stub with fixed answers.
#[derive(Debug, Default)]
pub struct RecordingUserService {
    usernames: HashMap<String, Uuid>,
    emails: HashMap<String, Uuid>,
    passwords: HashMap<Uuid, String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingUserService {
    /// A service that knows nobody.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `find_userid(username)` with `id`.
    pub fn with_user(mut self, username: &str, id: Uuid) -> Self {
        self.usernames.insert(username.to_string(), id);
        self
    }

    /// Answer `find_userid_by_email(email)` with `id`.
    pub fn with_email(mut self, email: &str, id: Uuid) -> Self {
        self.emails.insert(email.to_string(), id);
        self
    }

    /// Accept `password` for `id`.
    pub fn with_password(mut self, id: Uuid, password: &str) -> Self {
        self.passwords.insert(id, password.to_string());
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl UserService for RecordingUserService {
    fn find_userid(&self, username: &str) -> ManageResult<Option<Uuid>> {
        self.calls.lock().push(Call::FindUserid(username.to_string()));
        Ok(self.usernames.get(username).copied())
    }

    fn find_userid_by_email(&self, email: &str) -> ManageResult<Option<Uuid>> {
        self.calls
            .lock()
            .push(Call::FindUseridByEmail(email.to_string()));
        Ok(self.emails.get(email).copied())
    }

    fn check_password(&self, user_id: Uuid, password: &str) -> ManageResult<bool> {
        self.calls
            .lock()
            .push(Call::CheckPassword(user_id, password.to_string()));
        Ok(self.passwords.get(&user_id).is_some_and(|p| p == password))
    }
}

/// Breach service stub that flags a fixed set of passwords.
#[derive(Debug, Default)]
pub struct StaticBreachService {
    breached: Vec<String>,
    calls: Mutex<Vec<Call>>,
}

impl StaticBreachService {
    /// A service that flags nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `password` as breached.
    pub fn with_breached(mut self, password: &str) -> Self {
        self.breached.push(password.to_string());
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl BreachService for StaticBreachService {
    fn check_password(&self, password: &str) -> ManageResult<bool> {
        self.calls.lock().push(Call::CheckBreach(password.to_string()));
        Ok(self.breached.iter().any(|p| p == password))
    }

    fn failure_message(&self) -> String {
        "Breached password. Choose another.".to_string()
    }
}

/// TOTP verifier stub with a fixed answer.
#[derive(Debug)]
pub struct FixedTotpVerifier {
    answer: bool,
    calls: Mutex<Vec<Call>>,
}

impl FixedTotpVerifier {
    /// Verifier that answers `answer` for every code.
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl TotpVerifier for FixedTotpVerifier {
    fn verify(&self, code: &str, _secret: &TotpSecret) -> bool {
        self.calls.lock().push(Call::VerifyTotp(code.to_string()));
        self.answer
    }
}

/// Build form data from `(name, value)` pairs.
pub fn form_data(pairs: &[(&str, &str)]) -> FormData {
    FormData::from_pairs(pairs.iter().copied())
}

/// Assertion helpers for form errors.
pub mod assert {
    use pkgindex_manage::form::Field;

    /// Assert that a field carries exactly the given errors.
    pub fn field_errors(field: &Field, expected: &[&str]) {
        let actual: Vec<&str> = field.errors.iter().map(String::as_str).collect();
        assert_eq!(
            actual,
            expected,
            "unexpected errors on field '{}'",
            field.name()
        );
    }

    /// Assert that the last error on a field contains `needle`.
    pub fn last_error_contains(field: &Field, needle: &str) {
        let last = field.errors.last();
        assert!(
            last.is_some_and(|e| e.contains(needle)),
            "expected last error on '{}' to contain '{}', got: {:?}",
            field.name(),
            needle,
            field.errors
        );
    }
}
