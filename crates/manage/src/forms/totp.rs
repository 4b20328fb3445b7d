//! Enable and remove TOTP two-factor authentication.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::error::ManageResult;
use crate::form::{Field, Form, FormData, ValidationError, Validator};
use crate::otp::{TOTP_LENGTH, Totp, TotpSecret, TotpVerifier};
use crate::services::UserService;

use super::{check_username, username_field};

pub const INVALID_TOTP_CODE: &str = "Invalid TOTP code. Try again?";

#[allow(clippy::expect_used)]
static TOTP_CODE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^[0-9]{{{TOTP_LENGTH}}}$")).expect("valid regex literal")
});

/// Confirm enrolment by entering a code generated from `totp_secret`.
pub struct ProvisionTotpForm {
    pub totp_value: Field,
    totp_secret: TotpSecret,
    verifier: Arc<dyn TotpVerifier>,
}

impl ProvisionTotpForm {
    /// Bind submitted data, verifying against the wall clock.
    pub fn new(data: &FormData, totp_secret: TotpSecret) -> Self {
        Self {
            totp_value: Field::text("totp_value")
                .title("Authentication code")
                .placeholder("123456")
                .max_length(TOTP_LENGTH as usize)
                .with_optional_data(data.take("totp_value"))
                .validator(Validator::data_required())
                .validator(Validator::Regexp {
                    pattern: TOTP_CODE_SHAPE.clone(),
                    message: format!("TOTP code must be {TOTP_LENGTH} digits."),
                }),
            totp_secret,
            verifier: Arc::new(Totp::new()),
        }
    }

    /// Bind submitted data, verifying with the configured window.
    pub fn from_config(data: &FormData, totp_secret: TotpSecret, config: &Config) -> Self {
        Self::new(data, totp_secret).with_verifier(Arc::new(Totp::from_config(config)))
    }

    /// Replace the code verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn TotpVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// The secret being enrolled.
    pub fn totp_secret(&self) -> &TotpSecret {
        &self.totp_secret
    }

    /// The code must verify against the secret.
    pub fn validate_totp_value(&self, field: &Field) -> Result<(), ValidationError> {
        if self.verifier.verify(field.value(), &self.totp_secret) {
            Ok(())
        } else {
            Err(ValidationError::invalid(INVALID_TOTP_CODE))
        }
    }
}

impl Form for ProvisionTotpForm {
    fn form_id(&self) -> &'static str {
        "provision_totp"
    }

    fn fields(&self) -> Vec<&Field> {
        vec![&self.totp_value]
    }

    fn validate(&mut self) -> ManageResult<bool> {
        if self.totp_value.run_validators(&[]) {
            let outcome = self.validate_totp_value(&self.totp_value);
            self.totp_value.record(outcome)?;
        }

        let valid = self.is_valid();
        debug!(form_id = self.form_id(), valid, "form validated");
        Ok(valid)
    }
}

impl fmt::Debug for ProvisionTotpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionTotpForm")
            .field("totp_value", &self.totp_value)
            .field("totp_secret", &self.totp_secret)
            .finish_non_exhaustive()
    }
}

/// Remove TOTP from an account after confirming the username.
pub struct DeleteTotpForm {
    pub username: Field,
    user_service: Arc<dyn UserService>,
}

impl DeleteTotpForm {
    /// Bind submitted data.
    pub fn new(data: &FormData, user_service: Arc<dyn UserService>) -> Self {
        Self {
            username: username_field(data),
            user_service,
        }
    }

    /// The user lookup this form consults.
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.user_service
    }

    /// The confirmed user must exist.
    pub fn validate_username(&self, field: &Field) -> Result<(), ValidationError> {
        check_username(self.user_service.as_ref(), field)
    }
}

impl Form for DeleteTotpForm {
    fn form_id(&self) -> &'static str {
        "delete_totp"
    }

    fn fields(&self) -> Vec<&Field> {
        vec![&self.username]
    }

    fn validate(&mut self) -> ManageResult<bool> {
        if self.username.run_validators(&[]) {
            let outcome = self.validate_username(&self.username);
            self.username.record(outcome)?;
        }

        let valid = self.is_valid();
        debug!(form_id = self.form_id(), valid, "form validated");
        Ok(valid)
    }
}

impl fmt::Debug for DeleteTotpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteTotpForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
