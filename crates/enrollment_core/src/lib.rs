//! Core domain logic for course enrollment.
//! This crate owns the enrollment invariants: course capacity, the
//! per-teacher course cap, cascade deletes and the role gate.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::credential::{
    Argon2CredentialHasher, CredentialConfig, CredentialError, CredentialHasher,
};
pub use auth::gate::{authorize, grant, permissions, AccessDenied, Caller, Operation, Scope};
pub use config::{AdminBootstrapConfig, ConfigError, EnrollmentConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::course::{
    Course, CourseId, CourseValidationError, DEFAULT_MAX_STUDENTS, MAX_COURSES_PER_TEACHER,
};
pub use model::profile::{ProfileInput, Student, StudentId, Teacher, TeacherId};
pub use model::roster::CourseRoster;
pub use model::user::{Role, User, UserId};
pub use model::view::{CourseView, StudentView, TeacherView};
pub use repo::{
    CourseRepository, EntityStore, RelationshipRepository, RepoError, RepoResult, SqliteStore,
    StudentRepository, TeacherRepository, UserRepository,
};
pub use service::bootstrap::{ensure_admin, BootstrapOutcome};
pub use service::enrollment_service::{CourseRequest, EnrollmentService};
pub use service::error::{EnrollmentError, ServiceResult};
pub use service::identity_service::{IdentityService, RegistrationRequest};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
