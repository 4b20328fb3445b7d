//! Change the password of the signed-in account.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ManageResult;
use crate::form::{Field, Form, FormData, ValidationError, Validator};
use crate::services::{BreachService, UserService};

pub const INVALID_PASSWORD: &str = "The password is invalid. Try again.";
pub const PASSWORDS_DONT_MATCH: &str = "Your passwords don't match. Try again.";

/// Length rules for new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 4096,
        }
    }
}

impl PasswordPolicy {
    /// Policy using the configured minimum length.
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_length: config.password_min_length,
            ..Self::default()
        }
    }
}

/// Replace the current password after confirming it.
pub struct ChangePasswordForm {
    pub password: Field,
    pub new_password: Field,
    pub password_confirm: Field,
    user_id: Uuid,
    user_service: Arc<dyn UserService>,
    breach_service: Arc<dyn BreachService>,
}

impl ChangePasswordForm {
    /// Bind submitted data with the default policy.
    pub fn new(
        data: &FormData,
        user_id: Uuid,
        user_service: Arc<dyn UserService>,
        breach_service: Arc<dyn BreachService>,
    ) -> Self {
        Self {
            password: Field::password("password")
                .title("Current password")
                .with_optional_data(data.take("password"))
                .validator(Validator::data_required()),
            new_password: new_password_field(
                data.take("new_password"),
                PasswordPolicy::default(),
            ),
            password_confirm: Field::password("password_confirm")
                .title("Confirm new password")
                .with_optional_data(data.take("password_confirm"))
                .validator(Validator::data_required())
                .validator(Validator::EqualTo {
                    other: "new_password".to_string(),
                    message: PASSWORDS_DONT_MATCH.to_string(),
                }),
            user_id,
            user_service,
            breach_service,
        }
    }

    /// Apply a different length policy to `new_password`.
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        let submitted = self.new_password.data().map(str::to_string);
        self.new_password = new_password_field(submitted, policy);
        self
    }

    /// The user lookup this form consults.
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.user_service
    }

    /// The breach check this form consults.
    pub fn breach_service(&self) -> &Arc<dyn BreachService> {
        &self.breach_service
    }

    /// The current password must be correct.
    pub fn validate_password(&self, field: &Field) -> Result<(), ValidationError> {
        if self.user_service.check_password(self.user_id, field.value())? {
            Ok(())
        } else {
            Err(ValidationError::invalid(INVALID_PASSWORD))
        }
    }

    /// The new password must not appear in a known breach.
    pub fn validate_new_password(&self, field: &Field) -> Result<(), ValidationError> {
        if self.breach_service.check_password(field.value())? {
            Err(ValidationError::invalid(
                self.breach_service.failure_message(),
            ))
        } else {
            Ok(())
        }
    }
}

fn new_password_field(submitted: Option<String>, policy: PasswordPolicy) -> Field {
    Field::password("new_password")
        .title("New password")
        .with_optional_data(submitted)
        .validator(Validator::data_required())
        .validator(Validator::Length {
            min: Some(policy.min_length),
            max: None,
            message: Some(format!(
                "Password must be at least {} characters.",
                policy.min_length
            )),
        })
        .validator(Validator::Length {
            min: None,
            max: Some(policy.max_length),
            message: Some(format!(
                "Password must be at most {} characters.",
                policy.max_length
            )),
        })
}

impl Form for ChangePasswordForm {
    fn form_id(&self) -> &'static str {
        "change_password"
    }

    fn fields(&self) -> Vec<&Field> {
        vec![&self.password, &self.new_password, &self.password_confirm]
    }

    fn validate(&mut self) -> ManageResult<bool> {
        if self.password.run_validators(&[]) {
            let outcome = self.validate_password(&self.password);
            self.password.record(outcome)?;
        }

        if self.new_password.run_validators(&[]) {
            let outcome = self.validate_new_password(&self.new_password);
            self.new_password.record(outcome)?;
        }

        self.password_confirm.run_validators(&[&self.new_password]);

        let valid = self.is_valid();
        debug!(form_id = self.form_id(), user_id = %self.user_id, valid, "form validated");
        Ok(valid)
    }
}

impl fmt::Debug for ChangePasswordForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordForm")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
