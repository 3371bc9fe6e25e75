//! Service error taxonomy shared by every use-case.

use crate::auth::credential::CredentialError;
use crate::auth::gate::AccessDenied;
use crate::model::course::{CourseId, CourseValidationError};
use crate::model::profile::{StudentId, TeacherId};
use crate::repo::{EntityKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, EnrollmentError>;

/// Failure surfaced to the (external) transport layer.
#[derive(Debug)]
pub enum EnrollmentError {
    CourseNotFound(CourseId),
    StudentNotFound(StudentId),
    TeacherNotFound(TeacherId),
    UserNotFound(String),
    /// A business invariant would be violated.
    ValidationFailed(String),
    Unauthorized(AccessDenied),
    /// Credential check failed. Deliberately carries no detail.
    Unauthenticated,
    Credential(CredentialError),
    Repo(RepoError),
}

impl EnrollmentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    /// Stable error code for transport mapping and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CourseNotFound(_) => "course_not_found",
            Self::StudentNotFound(_) => "student_not_found",
            Self::TeacherNotFound(_) => "teacher_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::ValidationFailed(_) => "validation_failed",
            Self::Unauthorized(_) => "unauthorized",
            Self::Unauthenticated => "unauthenticated",
            Self::Credential(_) => "credential_error",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for EnrollmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::TeacherNotFound(id) => write!(f, "teacher not found: {id}"),
            Self::UserNotFound(username) => write!(f, "user not found: {username}"),
            Self::ValidationFailed(message) => write!(f, "validation failed: {message}"),
            Self::Unauthorized(denied) => write!(f, "unauthorized: {denied}"),
            Self::Unauthenticated => write!(f, "invalid username, password, or role"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EnrollmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unauthorized(err) => Some(err),
            Self::Credential(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EnrollmentError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: EntityKind::Course,
                id,
            } => Self::CourseNotFound(id),
            RepoError::NotFound {
                entity: EntityKind::Student,
                id,
            } => Self::StudentNotFound(id),
            RepoError::NotFound {
                entity: EntityKind::Teacher,
                id,
            } => Self::TeacherNotFound(id),
            RepoError::NotFound {
                entity: EntityKind::User,
                id,
            } => Self::UserNotFound(id.to_string()),
            RepoError::Validation(err) => Self::ValidationFailed(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<CourseValidationError> for EnrollmentError {
    fn from(value: CourseValidationError) -> Self {
        Self::ValidationFailed(value.to_string())
    }
}

impl From<AccessDenied> for EnrollmentError {
    fn from(value: AccessDenied) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<CredentialError> for EnrollmentError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}
