//! Entity Store: repository contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define one accessor contract per entity kind plus the relationship
//!   edge contract.
//! - Provide `EntityStore::atomic` so services can sequence multi-entity
//!   writes as one all-or-nothing unit.
//! - Isolate SQL details from the enrollment rules.
//!
//! # Invariants
//! - Repositories hold no business rules beyond field validation.
//! - Each single call is atomic; `atomic` commits only when its closure
//!   returns `Ok`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::course::CourseValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod course_repo;
pub mod relationship_repo;
pub mod sqlite_store;
pub mod student_repo;
pub mod teacher_repo;
pub mod user_repo;

pub use course_repo::CourseRepository;
pub use relationship_repo::RelationshipRepository;
pub use sqlite_store::SqliteStore;
pub use student_repo::StudentRepository;
pub use teacher_repo::TeacherRepository;
pub use user_repo::UserRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kinds addressable through the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Course,
    Student,
    Teacher,
    User,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::User => "user",
        }
    }
}

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { entity: EntityKind, id: i64 },
    Validation(CourseValidationError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{} not found: {id}", entity.as_str()),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) | Self::UninitializedConnection { .. } => {
                None
            }
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CourseValidationError> for RepoError {
    fn from(value: CourseValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Full store capability consumed by the services.
pub trait EntityStore:
    CourseRepository + StudentRepository + TeacherRepository + UserRepository + RelationshipRepository
{
    /// Runs `work` as one transaction.
    ///
    /// Commits when `work` returns `Ok`; any `Err` rolls back every write
    /// `work` made and is returned unchanged. Calls must not nest.
    fn atomic<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;

    /// Runs read-only `work` against one consistent snapshot.
    ///
    /// Writes committed by other connections while `work` runs are not
    /// observed. Calls must not nest with each other or with `atomic`.
    fn read_snapshot<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;
}
