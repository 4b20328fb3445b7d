//! User lookup service.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ManageError, ManageResult};
use crate::models::{Email, User};

/// Lookups the account forms need from the user store.
#[cfg_attr(test, mockall::automock)]
pub trait UserService: Send + Sync {
    /// Resolve a username to a user id.
    fn find_userid(&self, username: &str) -> ManageResult<Option<Uuid>>;

    /// Resolve an email address to the id of the user that owns it.
    fn find_userid_by_email(&self, email: &str) -> ManageResult<Option<Uuid>>;

    /// Check a password for a user.
    fn check_password(&self, user_id: Uuid, password: &str) -> ManageResult<bool>;
}

/// In-process user store.
///
/// Usernames and email addresses are matched case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryUserService {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserService {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. Fails if the username or any email is taken.
    pub fn add_user(&self, user: User) -> ManageResult<Uuid> {
        let mut users = self.users.write();

        let username = user.username.to_lowercase();
        if users.values().any(|u| u.username.to_lowercase() == username) {
            return Err(ManageError::UsernameTaken(user.username));
        }
        for email in &user.emails {
            if owner_of(&users, &email.email).is_some() {
                return Err(ManageError::EmailTaken(email.email.clone()));
            }
        }

        let id = user.id;
        debug!(user_id = %id, username = %user.username, "user added");
        users.insert(id, user);
        Ok(id)
    }

    /// Attach an email address to an existing user.
    pub fn add_email(&self, user_id: Uuid, email: Email) -> ManageResult<()> {
        let mut users = self.users.write();

        if owner_of(&users, &email.email).is_some() {
            return Err(ManageError::EmailTaken(email.email));
        }
        let user = users
            .get_mut(&user_id)
            .ok_or(ManageError::UnknownUser(user_id))?;
        user.emails.push(email);
        Ok(())
    }

    /// Fetch a copy of a user record.
    pub fn get(&self, user_id: Uuid) -> Option<User> {
        self.users.read().get(&user_id).cloned()
    }

    /// Apply a change to a stored user.
    pub fn update<F>(&self, user_id: Uuid, change: F) -> ManageResult<()>
    where
        F: FnOnce(&mut User) -> ManageResult<()>,
    {
        let mut users = self.users.write();
        let user = users
            .get_mut(&user_id)
            .ok_or(ManageError::UnknownUser(user_id))?;
        change(user)
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether no users are registered.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

fn owner_of(users: &HashMap<Uuid, User>, email: &str) -> Option<Uuid> {
    let email = email.to_lowercase();
    users
        .values()
        .find(|u| u.emails.iter().any(|e| e.email.to_lowercase() == email))
        .map(|u| u.id)
}

impl UserService for InMemoryUserService {
    fn find_userid(&self, username: &str) -> ManageResult<Option<Uuid>> {
        let username = username.to_lowercase();
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username.to_lowercase() == username)
            .map(|u| u.id))
    }

    fn find_userid_by_email(&self, email: &str) -> ManageResult<Option<Uuid>> {
        Ok(owner_of(&self.users.read(), email))
    }

    fn check_password(&self, user_id: Uuid, password: &str) -> ManageResult<bool> {
        let users = self.users.read();
        let user = users.get(&user_id).ok_or(ManageError::UnknownUser(user_id))?;
        Ok(user.is_active && user.verify_password(password))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn service_with_alice() -> (InMemoryUserService, Uuid) {
        let service = InMemoryUserService::new();
        let mut alice = User::new("Alice", "Alice A.", "s3cret-pass").unwrap();
        alice.emails.push(Email::new("Alice@Example.com").primary().verified());
        let id = service.add_user(alice).unwrap();
        (service, id)
    }

    #[test]
    fn test_lookups_are_case_insensitive() {
        let (service, id) = service_with_alice();

        assert_eq!(service.find_userid("alice").unwrap(), Some(id));
        assert_eq!(service.find_userid("ALICE").unwrap(), Some(id));
        assert_eq!(service.find_userid("bob").unwrap(), None);
        assert_eq!(
            service.find_userid_by_email("alice@example.COM").unwrap(),
            Some(id)
        );
        assert_eq!(service.find_userid_by_email("x@example.com").unwrap(), None);
    }

    #[test]
    fn test_duplicates_rejected() {
        let (service, id) = service_with_alice();

        let dup = User::new("aLiCe", "Other", "whatever-pw").unwrap();
        assert!(matches!(
            service.add_user(dup),
            Err(ManageError::UsernameTaken(_))
        ));

        let bob = User::new("bob", "Bob", "whatever-pw").unwrap();
        let bob_id = service.add_user(bob).unwrap();
        assert!(matches!(
            service.add_email(bob_id, Email::new("ALICE@example.com")),
            Err(ManageError::EmailTaken(_))
        ));
        service.add_email(bob_id, Email::new("bob@example.com")).unwrap();

        assert_eq!(service.len(), 2);
        assert_ne!(id, bob_id);
    }

    #[test]
    fn test_check_password() {
        let (service, id) = service_with_alice();

        assert!(service.check_password(id, "s3cret-pass").unwrap());
        assert!(!service.check_password(id, "nope").unwrap());

        service
            .update(id, |u| {
                u.is_active = false;
                Ok(())
            })
            .unwrap();
        assert!(!service.check_password(id, "s3cret-pass").unwrap());

        assert!(matches!(
            service.check_password(Uuid::nil(), "x"),
            Err(ManageError::UnknownUser(_))
        ));
    }
}
