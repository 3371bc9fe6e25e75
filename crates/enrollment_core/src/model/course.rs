//! Course entity.
//!
//! # Invariants
//! - `max_students >= 1`.
//! - `teacher_id` is the only stored Course -> Teacher edge.

use crate::model::profile::TeacherId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned course identifier.
pub type CourseId = i64;

/// Capacity used when the caller does not pick one.
pub const DEFAULT_MAX_STUDENTS: u32 = 30;

/// Upper bound on the number of courses one teacher may teach at a time.
pub const MAX_COURSES_PER_TEACHER: usize = 5;

/// Course record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Enrollment capacity. Always >= 1.
    pub max_students: u32,
    /// Assigned teacher, if any.
    pub teacher_id: Option<TeacherId>,
}

/// Course field validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseValidationError {
    ZeroCapacity,
    /// Requested capacity is below the number of already enrolled students.
    CapacityBelowEnrollment { max_students: u32, enrolled: usize },
}

impl Display for CourseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "max students must be at least 1"),
            Self::CapacityBelowEnrollment {
                max_students,
                enrolled,
            } => write!(
                f,
                "max students {max_students} is below current enrollment {enrolled}"
            ),
        }
    }
}

impl Error for CourseValidationError {}

impl Course {
    /// Validates scalar fields before they reach storage.
    pub fn validate(&self) -> Result<(), CourseValidationError> {
        validate_capacity(self.max_students)
    }
}

/// Rejects a zero capacity.
pub fn validate_capacity(max_students: u32) -> Result<(), CourseValidationError> {
    if max_students == 0 {
        return Err(CourseValidationError::ZeroCapacity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_capacity, Course, CourseValidationError, DEFAULT_MAX_STUDENTS};

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            validate_capacity(0),
            Err(CourseValidationError::ZeroCapacity)
        );
        assert!(validate_capacity(1).is_ok());
    }

    #[test]
    fn course_serializes_with_camel_case_fields() {
        let course = Course {
            id: 4,
            name: "Compilers".to_string(),
            max_students: DEFAULT_MAX_STUDENTS,
            teacher_id: None,
        };
        course.validate().expect("default capacity is valid");

        let json = serde_json::to_value(&course).expect("course should serialize");
        assert_eq!(json["maxStudents"], 30);
        assert!(json["teacherId"].is_null());
    }
}
