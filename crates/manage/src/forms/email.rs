//! Attach another email address to an account.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::blocklist::DomainBlocklist;
use crate::error::ManageResult;
use crate::form::{Field, Form, FormData, ValidationError, Validator};
use crate::services::UserService;

/// Longest address accepted.
pub const MAX_EMAIL_LENGTH: usize = 254;

pub const EMAIL_USED_BY_THIS_ACCOUNT: &str =
    "This email address is already being used by this account. Use a different email.";
pub const EMAIL_USED_BY_ANOTHER_ACCOUNT: &str =
    "This email address is already being used by another account. Use a different email.";
pub const EMAIL_DOMAIN_BLOCKED: &str =
    "You can't use an email address from this domain. Use a different email.";

/// Add `email` to the account identified by `user_id`.
pub struct AddEmailForm {
    pub email: Field,
    user_id: Uuid,
    user_service: Arc<dyn UserService>,
    blocklist: DomainBlocklist,
}

impl AddEmailForm {
    /// Bind submitted data, rejecting the built-in disposable domains.
    pub fn new(data: &FormData, user_service: Arc<dyn UserService>, user_id: Uuid) -> Self {
        Self {
            email: Field::email("email")
                .title("Email address")
                .placeholder("you@example.com")
                .with_optional_data(data.take("email"))
                .validator(Validator::data_required())
                .validator(Validator::Length {
                    min: None,
                    max: Some(MAX_EMAIL_LENGTH),
                    message: Some("The email address is too long. Try again.".to_string()),
                })
                .validator(Validator::Email {
                    message: "The email address isn't valid. Try again.".to_string(),
                }),
            user_id,
            user_service,
            blocklist: DomainBlocklist::default(),
        }
    }

    /// Replace the domain blocklist.
    pub fn with_blocklist(mut self, blocklist: DomainBlocklist) -> Self {
        self.blocklist = blocklist;
        self
    }

    /// The user lookup this form consults.
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.user_service
    }

    /// The account the address is being added to.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Ownership is checked before the domain, and the first failure wins.
    pub fn validate_email(&self, field: &Field) -> Result<(), ValidationError> {
        let email = field.value();

        match self.user_service.find_userid_by_email(email)? {
            Some(owner) if owner == self.user_id => {
                return Err(ValidationError::invalid(EMAIL_USED_BY_THIS_ACCOUNT));
            }
            Some(_) => return Err(ValidationError::invalid(EMAIL_USED_BY_ANOTHER_ACCOUNT)),
            None => {}
        }

        if self.blocklist.is_blocked_email(email) {
            return Err(ValidationError::invalid(EMAIL_DOMAIN_BLOCKED));
        }

        Ok(())
    }
}

impl Form for AddEmailForm {
    fn form_id(&self) -> &'static str {
        "add_email"
    }

    fn fields(&self) -> Vec<&Field> {
        vec![&self.email]
    }

    fn validate(&mut self) -> ManageResult<bool> {
        if self.email.run_validators(&[]) {
            let outcome = self.validate_email(&self.email);
            self.email.record(outcome)?;
        }

        let valid = self.is_valid();
        debug!(form_id = self.form_id(), user_id = %self.user_id, valid, "form validated");
        Ok(valid)
    }
}

impl fmt::Debug for AddEmailForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddEmailForm")
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::user::MockUserService;

    fn lookup_returning(owner: Option<Uuid>) -> Arc<dyn UserService> {
        let mut service = MockUserService::new();
        service
            .expect_find_userid_by_email()
            .returning(move |_| Ok(owner));
        Arc::new(service)
    }

    fn form_for(email: &str, owner: Option<Uuid>, user_id: Uuid) -> AddEmailForm {
        AddEmailForm::new(
            &FormData::from_pairs([("email", email)]),
            lookup_returning(owner),
            user_id,
        )
    }

    #[test]
    fn test_email_exists_error() {
        let user_id = Uuid::now_v7();
        let mut form = form_for("foo@bar.com", Some(user_id), user_id);

        assert!(!form.validate().unwrap());
        assert_eq!(
            form.email.errors.pop().as_deref(),
            Some(EMAIL_USED_BY_THIS_ACCOUNT)
        );
    }

    #[test]
    fn test_email_exists_other_account_error() {
        let mut form = form_for("foo@bar.com", Some(Uuid::now_v7()), Uuid::now_v7());

        assert!(!form.validate().unwrap());
        assert_eq!(
            form.email.errors.pop().as_deref(),
            Some(EMAIL_USED_BY_ANOTHER_ACCOUNT)
        );
    }

    #[test]
    fn test_blocked_domain_error() {
        let mut form = form_for("foo@bearsarefuzzy.com", None, Uuid::now_v7());

        assert!(!form.validate().unwrap());
        assert_eq!(form.email.errors.pop().as_deref(), Some(EMAIL_DOMAIN_BLOCKED));
    }

    #[test]
    fn test_ownership_checked_before_domain() {
        let user_id = Uuid::now_v7();
        let mut form = form_for("foo@bearsarefuzzy.com", Some(user_id), user_id);

        assert!(!form.validate().unwrap());
        assert_eq!(form.email.errors, vec![EMAIL_USED_BY_THIS_ACCOUNT.to_string()]);
    }

    #[test]
    fn test_custom_blocklist() {
        let mut form = form_for("foo@bearsarefuzzy.com", None, Uuid::now_v7())
            .with_blocklist(DomainBlocklist::empty().with_domains(["corp.example"]));
        assert!(form.validate().unwrap());

        let mut form = form_for("foo@Corp.Example", None, Uuid::now_v7())
            .with_blocklist(DomainBlocklist::empty().with_domains(["corp.example"]));
        assert!(!form.validate().unwrap());
    }

    #[test]
    fn test_malformed_address() {
        let mut form = form_for("not-an-email", None, Uuid::now_v7());

        assert!(!form.validate().unwrap());
        assert_eq!(
            form.email.errors,
            vec!["The email address isn't valid. Try again.".to_string()]
        );
    }

    #[test]
    fn test_missing_email_skips_lookup() {
        let mut service = MockUserService::new();
        service.expect_find_userid_by_email().never();
        let mut form = AddEmailForm::new(&FormData::new(), Arc::new(service), Uuid::now_v7());

        assert!(!form.validate().unwrap());
        assert_eq!(form.email.errors, vec!["This field is required.".to_string()]);
    }

    #[test]
    fn test_valid_email() {
        let mut form = form_for("new@example.org", None, Uuid::now_v7());
        assert!(form.validate().unwrap());
        assert!(form.errors().is_empty());
    }
}
