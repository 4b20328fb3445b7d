//! Collaborator services consulted by the account forms.

pub mod breach;
pub mod user;

pub use breach::{BreachService, HibpBreachService, NullBreachService};
pub use user::{InMemoryUserService, UserService};
