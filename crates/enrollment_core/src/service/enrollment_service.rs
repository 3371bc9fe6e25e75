//! Enrollment rules engine.
//!
//! # Responsibility
//! - Create/update/delete courses and keep their teacher/student edges
//!   within capacity.
//! - Enroll and unenroll students under the role gate.
//! - Assign and unassign teachers under the five-course cap.
//!
//! # Invariants
//! - `|enrolled| <= max_students` for every course after every commit.
//! - A teacher teaches at most `MAX_COURSES_PER_TEACHER` courses.
//! - Each public mutation is one `EntityStore::atomic` unit; every check
//!   runs before the first write.

use crate::auth::gate::{authorize, Caller, Operation};
use crate::model::course::{
    validate_capacity, Course, CourseId, CourseValidationError, DEFAULT_MAX_STUDENTS,
    MAX_COURSES_PER_TEACHER,
};
use crate::model::profile::{Student, StudentId, Teacher, TeacherId};
use crate::model::roster::CourseRoster;
use crate::model::view::{CourseView, StudentView, TeacherView};
use crate::repo::EntityStore;
use crate::service::error::{EnrollmentError, ServiceResult};
use log::{info, warn};
use std::fmt::Arguments;

/// Input for `create_course` / `update_course`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRequest {
    pub name: String,
    pub max_students: u32,
    /// On create: initial teacher. On update: new teacher, `None` keeps the
    /// current assignment.
    pub teacher_id: Option<TeacherId>,
}

impl CourseRequest {
    /// Request with the default capacity and no teacher.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_students: DEFAULT_MAX_STUDENTS,
            teacher_id: None,
        }
    }

    pub fn max_students(mut self, max_students: u32) -> Self {
        self.max_students = max_students;
        self
    }

    pub fn teacher(mut self, teacher_id: TeacherId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }
}

/// Enrollment service facade over an entity store.
pub struct EnrollmentService<S: EntityStore> {
    pub(super) store: S,
}

impl<S: EntityStore> EnrollmentService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a course, optionally assigning its first teacher.
    pub fn create_course(
        &self,
        caller: &Caller,
        request: &CourseRequest,
    ) -> ServiceResult<CourseView> {
        let result = self.store.atomic(|store| -> ServiceResult<CourseView> {
            if let Some(teacher_id) = request.teacher_id {
                require_teacher(store, teacher_id)?;
            }
            authorize(caller, Operation::ManageCourses, None)?;
            validate_capacity(request.max_students)?;
            if let Some(teacher_id) = request.teacher_id {
                ensure_teacher_has_capacity(store, teacher_id)?;
            }

            let course = store.create_course(&request.name, request.max_students)?;
            let mut roster = CourseRoster::new(&course, []);
            if let Some(teacher_id) = request.teacher_id {
                roster.link_teacher(teacher_id);
                store.set_course_teacher(course.id, roster.teacher_id())?;
            }
            Ok(roster_view(&course, &roster))
        });

        log_outcome(
            "course_create",
            format_args!("teacher_id={:?}", request.teacher_id),
            &result,
        );
        result
    }

    /// Updates scalar fields and, when it differs, the assigned teacher.
    pub fn update_course(
        &self,
        caller: &Caller,
        course_id: CourseId,
        request: &CourseRequest,
    ) -> ServiceResult<CourseView> {
        let result = self.store.atomic(|store| -> ServiceResult<CourseView> {
            let course = require_course(store, course_id)?;
            if let Some(teacher_id) = request.teacher_id {
                require_teacher(store, teacher_id)?;
            }
            authorize(caller, Operation::ManageCourses, None)?;
            validate_capacity(request.max_students)?;

            let mut roster = load_roster(store, &course)?;
            if (request.max_students as usize) < roster.enrolled_count() {
                return Err(CourseValidationError::CapacityBelowEnrollment {
                    max_students: request.max_students,
                    enrolled: roster.enrolled_count(),
                }
                .into());
            }

            // An unchanged teacher keeps its assignment without a recount.
            if let Some(teacher_id) = request.teacher_id {
                if !roster.is_taught_by(teacher_id) {
                    ensure_teacher_has_capacity(store, teacher_id)?;
                    roster.link_teacher(teacher_id);
                    store.set_course_teacher(course_id, roster.teacher_id())?;
                }
            }

            let updated = Course {
                id: course_id,
                name: request.name.clone(),
                max_students: request.max_students,
                teacher_id: roster.teacher_id(),
            };
            store.update_course(&updated)?;
            Ok(roster_view(&updated, &roster))
        });

        log_outcome(
            "course_update",
            format_args!("course_id={course_id}"),
            &result,
        );
        result
    }

    /// Deletes a course after severing all of its edges.
    pub fn delete_course(&self, caller: &Caller, course_id: CourseId) -> ServiceResult<()> {
        let result = self.store.atomic(|store| -> ServiceResult<usize> {
            let course = require_course(store, course_id)?;
            authorize(caller, Operation::ManageCourses, None)?;

            let mut roster = load_roster(store, &course)?;
            let unenrolled = roster.clear_students().len();
            store.clear_course_enrollments(course_id)?;
            if roster.unlink_teacher().is_some() {
                store.set_course_teacher(course_id, None)?;
            }
            store.delete_course(course_id)?;
            Ok(unenrolled)
        });

        log_outcome(
            "course_delete",
            format_args!(
                "course_id={course_id} unenrolled={}",
                result.as_ref().map_or(0, |count| *count)
            ),
            &result,
        );
        result.map(|_| ())
    }

    /// Enrolls a student into a course.
    ///
    /// ADMIN may enroll anywhere; TEACHER only into courses it teaches.
    pub fn add_student_to_course(
        &self,
        course_id: CourseId,
        student_id: StudentId,
        caller: &Caller,
    ) -> ServiceResult<CourseView> {
        let result = self.store.atomic(|store| -> ServiceResult<CourseView> {
            let course = require_course(store, course_id)?;
            require_student(store, student_id)?;
            authorize(caller, Operation::EnrollStudent, course.teacher_id)?;

            let mut roster = load_roster(store, &course)?;
            if roster.is_enrolled(student_id) {
                return Err(EnrollmentError::validation(format!(
                    "student {student_id} is already enrolled in course {course_id}"
                )));
            }
            if roster.is_full() {
                return Err(EnrollmentError::validation(format!(
                    "course {course_id} is full ({} students)",
                    roster.max_students()
                )));
            }

            roster.link_student(student_id);
            store.insert_enrollment(course_id, student_id)?;
            Ok(roster_view(&course, &roster))
        });

        log_outcome(
            "enrollment_add",
            format_args!(
                "course_id={course_id} student_id={student_id} caller_role={}",
                caller.role
            ),
            &result,
        );
        result
    }

    /// Removes a student from a course.
    ///
    /// Removing a student who is not enrolled is `ValidationFailed`.
    pub fn remove_student_from_course(
        &self,
        course_id: CourseId,
        student_id: StudentId,
        caller: &Caller,
    ) -> ServiceResult<CourseView> {
        let result = self.store.atomic(|store| -> ServiceResult<CourseView> {
            let course = require_course(store, course_id)?;
            require_student(store, student_id)?;
            authorize(caller, Operation::UnenrollStudent, course.teacher_id)?;

            let mut roster = load_roster(store, &course)?;
            if !roster.is_enrolled(student_id) {
                return Err(EnrollmentError::validation(format!(
                    "student {student_id} is not enrolled in course {course_id}"
                )));
            }

            roster.unlink_student(student_id);
            store.delete_enrollment(course_id, student_id)?;
            Ok(roster_view(&course, &roster))
        });

        log_outcome(
            "enrollment_remove",
            format_args!(
                "course_id={course_id} student_id={student_id} caller_role={}",
                caller.role
            ),
            &result,
        );
        result
    }

    /// Assigns a teacher to a course, taking the course from its previous
    /// teacher if it had one.
    ///
    /// Assigning the current teacher again succeeds without changes.
    pub fn assign_teacher_to_course(
        &self,
        caller: &Caller,
        teacher_id: TeacherId,
        course_id: CourseId,
    ) -> ServiceResult<TeacherView> {
        let result = self
            .store
            .atomic(|store| -> ServiceResult<(TeacherView, Option<TeacherId>)> {
                let teacher = require_teacher(store, teacher_id)?;
                let course = require_course(store, course_id)?;
                authorize(caller, Operation::AssignTeacher, course.teacher_id)?;

                let mut roster = CourseRoster::new(&course, []);
                if roster.is_taught_by(teacher_id) {
                    return Ok((teacher_view(store, teacher)?, Some(teacher_id)));
                }
                ensure_teacher_has_capacity(store, teacher_id)?;

                let previous = roster.link_teacher(teacher_id);
                store.set_course_teacher(course_id, roster.teacher_id())?;
                Ok((teacher_view(store, teacher)?, previous))
            });

        log_outcome(
            "teacher_assign",
            format_args!(
                "course_id={course_id} teacher_id={teacher_id} previous_teacher_id={:?}",
                result.as_ref().ok().and_then(|(_, previous)| *previous)
            ),
            &result,
        );
        result.map(|(view, _)| view)
    }

    /// Clears a teacher's assignment to a course.
    pub fn unassign_teacher_from_course(
        &self,
        caller: &Caller,
        teacher_id: TeacherId,
        course_id: CourseId,
    ) -> ServiceResult<TeacherView> {
        let result = self.store.atomic(|store| -> ServiceResult<TeacherView> {
            let teacher = require_teacher(store, teacher_id)?;
            let course = require_course(store, course_id)?;
            authorize(caller, Operation::AssignTeacher, course.teacher_id)?;

            let mut roster = CourseRoster::new(&course, []);
            if !roster.is_taught_by(teacher_id) {
                return Err(EnrollmentError::validation(format!(
                    "teacher {teacher_id} is not assigned to course {course_id}"
                )));
            }

            roster.unlink_teacher();
            store.set_course_teacher(course_id, roster.teacher_id())?;
            teacher_view(store, teacher)
        });

        log_outcome(
            "teacher_unassign",
            format_args!("course_id={course_id} teacher_id={teacher_id}"),
            &result,
        );
        result
    }

    pub fn get_course(&self, course_id: CourseId) -> ServiceResult<CourseView> {
        self.store.read_snapshot(|store| -> ServiceResult<CourseView> {
            let course = require_course(store, course_id)?;
            course_view(store, course)
        })
    }

    /// Lists courses ordered by id.
    pub fn list_courses(&self) -> ServiceResult<Vec<CourseView>> {
        self.store.read_snapshot(|store| -> ServiceResult<Vec<CourseView>> {
            store
                .list_courses()?
                .into_iter()
                .map(|course| course_view(store, course))
                .collect()
        })
    }
}

pub(super) fn require_course<S: EntityStore>(
    store: &S,
    course_id: CourseId,
) -> ServiceResult<Course> {
    store
        .get_course(course_id)?
        .ok_or(EnrollmentError::CourseNotFound(course_id))
}

pub(super) fn require_student<S: EntityStore>(
    store: &S,
    student_id: StudentId,
) -> ServiceResult<Student> {
    store
        .get_student(student_id)?
        .ok_or(EnrollmentError::StudentNotFound(student_id))
}

pub(super) fn require_teacher<S: EntityStore>(
    store: &S,
    teacher_id: TeacherId,
) -> ServiceResult<Teacher> {
    store
        .get_teacher(teacher_id)?
        .ok_or(EnrollmentError::TeacherNotFound(teacher_id))
}

fn load_roster<S: EntityStore>(store: &S, course: &Course) -> ServiceResult<CourseRoster> {
    let students = store.enrolled_student_ids(course.id)?;
    Ok(CourseRoster::new(course, students))
}

/// Fails when the teacher already teaches the maximum number of courses.
fn ensure_teacher_has_capacity<S: EntityStore>(
    store: &S,
    teacher_id: TeacherId,
) -> ServiceResult<()> {
    let taught = store.count_taught_courses(teacher_id)?;
    if taught >= MAX_COURSES_PER_TEACHER {
        return Err(EnrollmentError::validation(format!(
            "teacher {teacher_id} already teaches the maximum of {MAX_COURSES_PER_TEACHER} courses"
        )));
    }
    Ok(())
}

fn roster_view(course: &Course, roster: &CourseRoster) -> CourseView {
    CourseView {
        course: Course {
            teacher_id: roster.teacher_id(),
            ..course.clone()
        },
        enrolled_student_ids: roster.student_ids().collect(),
    }
}

pub(super) fn course_view<S: EntityStore>(
    store: &S,
    course: Course,
) -> ServiceResult<CourseView> {
    let enrolled_student_ids = store.enrolled_student_ids(course.id)?;
    Ok(CourseView {
        course,
        enrolled_student_ids,
    })
}

pub(super) fn student_view<S: EntityStore>(
    store: &S,
    student: Student,
) -> ServiceResult<StudentView> {
    let enrolled_course_ids = store.enrolled_course_ids(student.id)?;
    Ok(StudentView {
        student,
        enrolled_course_ids,
    })
}

pub(super) fn teacher_view<S: EntityStore>(
    store: &S,
    teacher: Teacher,
) -> ServiceResult<TeacherView> {
    let course_ids = store.taught_course_ids(teacher.id)?;
    Ok(TeacherView {
        teacher,
        course_ids,
    })
}

pub(super) fn log_outcome<T>(event: &str, fields: Arguments<'_>, result: &ServiceResult<T>) {
    match result {
        Ok(_) => info!("event={event} module=enrollment status=ok {fields}"),
        Err(err) => warn!(
            "event={event} module=enrollment status=error {fields} error_code={} error={err}",
            err.code()
        ),
    }
}
