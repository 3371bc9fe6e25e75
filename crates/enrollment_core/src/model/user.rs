//! Authentication identity and role.
//!
//! # Invariants
//! - `username` and `email` are unique across users; emails compare
//!   case-insensitively.
//! - `role_specific_id` points at a live profile of the matching role, or
//!   is `None`. ADMIN users never carry one.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned user identifier.
pub type UserId = i64;

/// Closed set of caller roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Teacher => "TEACHER",
            Self::Student => "STUDENT",
        }
    }

    /// Whether users of this role own a Student/Teacher profile.
    pub fn has_profile(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl Display for ParseRoleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported role `{}`; expected admin|teacher|student",
            self.0
        )
    }
}

impl Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    /// Accepts `admin`, `ADMIN` and the `ROLE_ADMIN` authority form.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.strip_prefix("ROLE_").unwrap_or(normalized.as_str()) {
            "ADMIN" => Ok(Self::Admin),
            "TEACHER" => Ok(Self::Teacher),
            "STUDENT" => Ok(Self::Student),
            _ => Err(ParseRoleError(value.trim().to_string())),
        }
    }
}

/// Stored identity. `credential_hash` is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub role: Role,
    pub role_specific_id: Option<i64>,
}

/// Insert shape for a new identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub credential_hash: String,
    pub role: Role,
    pub role_specific_id: Option<i64>,
}

/// Canonical form used for email uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
