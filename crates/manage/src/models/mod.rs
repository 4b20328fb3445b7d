//! Account models.

pub mod role;
pub mod user;

pub use role::Role;
pub use user::{Email, User};
