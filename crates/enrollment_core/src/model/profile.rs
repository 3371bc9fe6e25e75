//! Student and teacher profiles.
//!
//! Profiles carry scalar data only. Which courses a student attends or a
//! teacher teaches is read from the course side (see `model::view`).

use serde::{Deserialize, Serialize};

/// Store-assigned student identifier.
pub type StudentId = i64;
/// Store-assigned teacher identifier.
pub type TeacherId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub email: Option<String>,
}

/// Scalar input for creating or updating a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInput {
    pub name: String,
    pub email: Option<String>,
}

impl ProfileInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
