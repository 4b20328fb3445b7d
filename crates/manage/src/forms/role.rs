//! Add a collaborator to a project with a role.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::ManageResult;
use crate::form::{Field, Form, FormData, ValidationError, Validator};
use crate::models::Role;
use crate::services::UserService;

use super::{check_username, username_field};

/// Placeholder label, also the message when no role is picked.
pub const SELECT_ROLE: &str = "Select role";

/// Grant `role_name` on a project to the user named `username`.
pub struct CreateRoleForm {
    pub username: Field,
    pub role_name: Field,
    user_service: Arc<dyn UserService>,
}

impl CreateRoleForm {
    /// Bind submitted data.
    pub fn new(data: &FormData, user_service: Arc<dyn UserService>) -> Self {
        let mut options = vec![(String::new(), SELECT_ROLE.to_string())];
        options.extend(
            [Role::Maintainer, Role::Owner]
                .iter()
                .map(|r| (r.as_str().to_string(), r.as_str().to_string())),
        );

        Self {
            username: username_field(data),
            role_name: Field::select("role_name", options)
                .title("Role")
                .with_optional_data(data.take("role_name"))
                .validator(Validator::data_required_with(SELECT_ROLE)),
            user_service,
        }
    }

    /// Unbound form, for rendering an empty page.
    pub fn empty(user_service: Arc<dyn UserService>) -> Self {
        Self::new(&FormData::new(), user_service)
    }

    /// The user lookup this form consults.
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.user_service
    }

    /// The named user must exist.
    pub fn validate_username(&self, field: &Field) -> Result<(), ValidationError> {
        check_username(self.user_service.as_ref(), field)
    }

    /// The selected role, once `role_name` has validated.
    pub fn role(&self) -> Option<Role> {
        if !self.role_name.is_valid() {
            return None;
        }
        self.role_name.data()?.parse().ok()
    }
}

impl Form for CreateRoleForm {
    fn form_id(&self) -> &'static str {
        "create_role"
    }

    fn fields(&self) -> Vec<&Field> {
        vec![&self.username, &self.role_name]
    }

    fn validate(&mut self) -> ManageResult<bool> {
        if self.username.run_validators(&[]) {
            let outcome = self.validate_username(&self.username);
            self.username.record(outcome)?;
        }

        self.role_name.run_validators(&[]);

        let valid = self.is_valid();
        debug!(form_id = self.form_id(), valid, "form validated");
        Ok(valid)
    }
}

impl fmt::Debug for CreateRoleForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateRoleForm")
            .field("username", &self.username)
            .field("role_name", &self.role_name)
            .finish_non_exhaustive()
    }
}
