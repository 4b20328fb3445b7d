//! Package index account management.
//!
//! Validation for the account-management forms (role creation, email
//! addition, password change, TOTP provisioning and removal) together with
//! the collaborator services those forms consult.

pub mod blocklist;
pub mod config;
pub mod error;
pub mod form;
pub mod forms;
pub mod models;
pub mod otp;
pub mod services;

pub use config::Config;
pub use error::{ManageError, ManageResult};
