//! Role-scoped authorization gate.
//!
//! # Invariants
//! - Decisions depend only on (operation, caller, course ownership); the
//!   gate never touches storage.
//! - Anything not granted is denied. A course with no teacher is owned by
//!   no TEACHER caller.

use crate::model::profile::TeacherId;
use crate::model::user::{Role, User};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authenticated caller as seen by the services.
///
/// `id` is the caller's role-scoped identity: the teacher id for TEACHER,
/// the student id for STUDENT, the user id for ADMIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn admin(user_id: i64) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn teacher(teacher_id: TeacherId) -> Self {
        Self::new(teacher_id, Role::Teacher)
    }

    pub fn student(student_id: i64) -> Self {
        Self::new(student_id, Role::Student)
    }

    /// Derives the caller from a stored identity.
    ///
    /// Returns `None` for a TEACHER/STUDENT user whose profile link was
    /// cleared; such a user holds no role-scoped identity.
    pub fn from_user(user: &User) -> Option<Self> {
        match user.role {
            Role::Admin => Some(Self::admin(user.id)),
            role => user.role_specific_id.map(|id| Self::new(id, role)),
        }
    }
}

/// Relationship mutations guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Operation {
    ManageCourses,
    ManageStudents,
    ManageTeachers,
    AssignTeacher,
    EnrollStudent,
    UnenrollStudent,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Self::ManageCourses,
        Self::ManageStudents,
        Self::ManageTeachers,
        Self::AssignTeacher,
        Self::EnrollStudent,
        Self::UnenrollStudent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageCourses => "manage_courses",
            Self::ManageStudents => "manage_students",
            Self::ManageTeachers => "manage_teachers",
            Self::AssignTeacher => "assign_teacher",
            Self::EnrollStudent => "enroll_student",
            Self::UnenrollStudent => "unenroll_student",
        }
    }
}

/// How far a granted permission reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    /// Any target.
    Any,
    /// Only courses whose assigned teacher is the caller.
    TaughtCourses,
}

/// Denied authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDenied {
    pub operation: Operation,
    pub role: Role,
    pub caller_id: i64,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} is not permitted to {}",
            self.role,
            self.caller_id,
            self.operation.as_str()
        )
    }
}

impl Error for AccessDenied {}

/// Permission matrix.
pub fn grant(role: Role, operation: Operation) -> Option<Scope> {
    match (role, operation) {
        (Role::Admin, _) => Some(Scope::Any),
        (Role::Teacher, Operation::EnrollStudent | Operation::UnenrollStudent) => {
            Some(Scope::TaughtCourses)
        }
        (Role::Teacher, _) | (Role::Student, _) => None,
    }
}

/// Lists every (operation, scope) pair the role holds.
pub fn permissions(role: Role) -> Vec<(Operation, Scope)> {
    Operation::ALL
        .into_iter()
        .filter_map(|operation| grant(role, operation).map(|scope| (operation, scope)))
        .collect()
}

/// Authorizes `caller` for `operation`.
///
/// `course_teacher` is the current teacher of the target course; it only
/// matters for `Scope::TaughtCourses` grants.
pub fn authorize(
    caller: &Caller,
    operation: Operation,
    course_teacher: Option<TeacherId>,
) -> Result<(), AccessDenied> {
    let allowed = match grant(caller.role, operation) {
        Some(Scope::Any) => true,
        Some(Scope::TaughtCourses) => course_teacher == Some(caller.id),
        None => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied {
            operation,
            role: caller.role,
            caller_id: caller.id,
        })
    }
}
