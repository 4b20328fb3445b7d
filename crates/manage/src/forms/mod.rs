//! Account-management forms.
//!
//! Each form is built per request from submitted [`FormData`] plus the
//! collaborators it needs, validated once, then discarded.
//!
//! [`FormData`]: crate::form::FormData

mod email;
mod password;
mod role;
mod totp;

pub use email::AddEmailForm;
pub use password::{ChangePasswordForm, PasswordPolicy};
pub use role::CreateRoleForm;
pub use totp::{DeleteTotpForm, ProvisionTotpForm};

use crate::form::{Field, FormData, ValidationError, Validator};
use crate::models::user::MAX_USERNAME_LENGTH;
use crate::services::UserService;

/// Recorded when a username does not resolve to an account.
pub const NO_SUCH_USER: &str = "No user found with that username. Try again.";

/// Username confirmation field shared by the role and TOTP-removal forms.
fn username_field(data: &FormData) -> Field {
    Field::text("username")
        .title("Username")
        .max_length(MAX_USERNAME_LENGTH)
        .with_optional_data(data.take("username"))
        .validator(Validator::data_required_with("Specify username"))
}

/// The username must belong to an existing account.
fn check_username(user_service: &dyn UserService, field: &Field) -> Result<(), ValidationError> {
    match user_service.find_userid(field.value())? {
        Some(_) => Ok(()),
        None => Err(ValidationError::invalid(NO_SUCH_USER)),
    }
}
