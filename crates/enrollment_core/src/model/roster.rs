//! In-memory relationship bookkeeping for one course.
//!
//! # Responsibility
//! - Hold the authoritative edges of a single course (teacher + students)
//!   while a service operation checks invariants against them.
//! - Apply link/unlink mutations as single local steps.
//!
//! # Invariants
//! - Student membership is a set; linking twice never duplicates.
//! - The roster never enforces capacity itself; services check
//!   `is_full()` before linking so they can report the failure.

use crate::model::course::{Course, CourseId};
use crate::model::profile::{StudentId, TeacherId};
use std::collections::BTreeSet;

/// Snapshot of one course's relationship edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRoster {
    course_id: CourseId,
    max_students: u32,
    teacher_id: Option<TeacherId>,
    students: BTreeSet<StudentId>,
}

impl CourseRoster {
    /// Builds a roster from a stored course and its enrolled student ids.
    pub fn new(course: &Course, students: impl IntoIterator<Item = StudentId>) -> Self {
        Self {
            course_id: course.id,
            max_students: course.max_students,
            teacher_id: course.teacher_id,
            students: students.into_iter().collect(),
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn teacher_id(&self) -> Option<TeacherId> {
        self.teacher_id
    }

    pub fn max_students(&self) -> u32 {
        self.max_students
    }

    pub fn enrolled_count(&self) -> usize {
        self.students.len()
    }

    pub fn is_enrolled(&self, student_id: StudentId) -> bool {
        self.students.contains(&student_id)
    }

    /// Capacity check uses `>=`: the Nth seat of an N-seat course is
    /// still available, the (N+1)th is not.
    pub fn is_full(&self) -> bool {
        self.students.len() >= self.max_students as usize
    }

    pub fn seats_remaining(&self) -> usize {
        (self.max_students as usize).saturating_sub(self.students.len())
    }

    /// Enrolled ids in ascending order.
    pub fn student_ids(&self) -> impl Iterator<Item = StudentId> + '_ {
        self.students.iter().copied()
    }

    /// Adds the student. Returns `false` when already enrolled.
    pub fn link_student(&mut self, student_id: StudentId) -> bool {
        self.students.insert(student_id)
    }

    /// Removes the student. Returns `false` (and changes nothing) when the
    /// student was not enrolled.
    pub fn unlink_student(&mut self, student_id: StudentId) -> bool {
        self.students.remove(&student_id)
    }

    /// Assigns the teacher, returning the one it replaced.
    pub fn link_teacher(&mut self, teacher_id: TeacherId) -> Option<TeacherId> {
        self.teacher_id.replace(teacher_id)
    }

    /// Clears the teacher, returning the one that was assigned.
    pub fn unlink_teacher(&mut self) -> Option<TeacherId> {
        self.teacher_id.take()
    }

    /// Removes every student, returning the ids that were enrolled.
    pub fn clear_students(&mut self) -> Vec<StudentId> {
        std::mem::take(&mut self.students).into_iter().collect()
    }

    pub fn is_taught_by(&self, teacher_id: TeacherId) -> bool {
        self.teacher_id == Some(teacher_id)
    }
}
