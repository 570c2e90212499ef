//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role, resolved from the `user_roles` side table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Runner,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Runner => "runner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `user_roles` row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRole {
    pub user_id: String,
    pub role: Role,
}

/// Profile columns embedded in a `user_roles` query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Profile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// `user_roles` row with its embedded profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRoleWithProfile {
    pub user_id: String,
    #[serde(default)]
    pub profiles: Option<Profile>,
}

/// Runner account as listed to admins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

impl From<UserRoleWithProfile> for RunnerProfile {
    fn from(row: UserRoleWithProfile) -> Self {
        let profile = row.profiles.unwrap_or_default();
        Self {
            id: row.user_id,
            email: profile.email.unwrap_or_default(),
            full_name: profile.full_name.unwrap_or_else(|| "Runner".to_string()),
        }
    }
}
