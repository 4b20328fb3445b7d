//! Project role model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role a user can hold on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Maintainer,
}

impl Role {
    /// Every assignable role, in display order.
    pub const ALL: [Role; 2] = [Role::Owner, Role::Maintainer];

    /// Name as submitted by forms and stored on role records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Maintainer => "Maintainer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}
