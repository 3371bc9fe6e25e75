//! Read views with relationship sets computed from the edge store.

use crate::model::course::{Course, CourseId};
use crate::model::profile::{Student, StudentId, Teacher};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub enrolled_student_ids: Vec<StudentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    #[serde(flatten)]
    pub student: Student,
    pub enrolled_course_ids: Vec<CourseId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherView {
    #[serde(flatten)]
    pub teacher: Teacher,
    pub course_ids: Vec<CourseId>,
}

impl CourseView {
    pub fn is_enrolled(&self, student_id: StudentId) -> bool {
        self.enrolled_student_ids.contains(&student_id)
    }
}

impl StudentView {
    pub fn is_enrolled_in(&self, course_id: CourseId) -> bool {
        self.enrolled_course_ids.contains(&course_id)
    }
}

impl TeacherView {
    pub fn teaches(&self, course_id: CourseId) -> bool {
        self.course_ids.contains(&course_id)
    }
}
