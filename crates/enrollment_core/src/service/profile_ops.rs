//! Student and teacher profile operations of the enrollment service.
//!
//! Deletes cascade inside the same transaction: edges first, then the
//! identity link, then the profile row.

use crate::auth::gate::{authorize, Caller, Operation};
use crate::model::profile::{ProfileInput, Student, StudentId, Teacher, TeacherId};
use crate::model::user::Role;
use crate::model::view::{StudentView, TeacherView};
use crate::repo::EntityStore;
use crate::service::enrollment_service::{
    log_outcome, require_student, require_teacher, student_view, teacher_view, EnrollmentService,
};
use crate::service::error::ServiceResult;

impl<S: EntityStore> EnrollmentService<S> {
    pub fn create_student(
        &self,
        caller: &Caller,
        input: &ProfileInput,
    ) -> ServiceResult<StudentView> {
        let result = self.store.atomic(|store| -> ServiceResult<StudentView> {
            authorize(caller, Operation::ManageStudents, None)?;
            let student = store.create_student(input)?;
            Ok(StudentView {
                student,
                enrolled_course_ids: Vec::new(),
            })
        });

        log_outcome(
            "student_create",
            format_args!(
                "student_id={:?}",
                result.as_ref().ok().map(|view| view.student.id)
            ),
            &result,
        );
        result
    }

    pub fn update_student(
        &self,
        caller: &Caller,
        student_id: StudentId,
        input: &ProfileInput,
    ) -> ServiceResult<StudentView> {
        let result = self.store.atomic(|store| -> ServiceResult<StudentView> {
            require_student(store, student_id)?;
            authorize(caller, Operation::ManageStudents, None)?;

            let updated = Student {
                id: student_id,
                name: input.name.clone(),
                email: input.email.clone(),
            };
            store.update_student(&updated)?;
            student_view(store, updated)
        });

        log_outcome(
            "student_update",
            format_args!("student_id={student_id}"),
            &result,
        );
        result
    }

    /// Deletes a student, unenrolling it from every course first.
    pub fn delete_student(&self, caller: &Caller, student_id: StudentId) -> ServiceResult<()> {
        let result = self.store.atomic(|store| -> ServiceResult<usize> {
            require_student(store, student_id)?;
            authorize(caller, Operation::ManageStudents, None)?;

            let unenrolled = store.clear_student_enrollments(student_id)?;
            store.clear_role_profile(Role::Student, student_id)?;
            store.delete_student(student_id)?;
            Ok(unenrolled)
        });

        log_outcome(
            "student_delete",
            format_args!(
                "student_id={student_id} unenrolled={}",
                result.as_ref().map_or(0, |count| *count)
            ),
            &result,
        );
        result.map(|_| ())
    }

    pub fn get_student(&self, student_id: StudentId) -> ServiceResult<StudentView> {
        self.store.read_snapshot(|store| -> ServiceResult<StudentView> {
            let student = require_student(store, student_id)?;
            student_view(store, student)
        })
    }

    pub fn list_students(&self) -> ServiceResult<Vec<StudentView>> {
        self.store.read_snapshot(|store| -> ServiceResult<Vec<StudentView>> {
            store
                .list_students()?
                .into_iter()
                .map(|student| student_view(store, student))
                .collect()
        })
    }

    pub fn create_teacher(
        &self,
        caller: &Caller,
        input: &ProfileInput,
    ) -> ServiceResult<TeacherView> {
        let result = self.store.atomic(|store| -> ServiceResult<TeacherView> {
            authorize(caller, Operation::ManageTeachers, None)?;
            let teacher = store.create_teacher(input)?;
            Ok(TeacherView {
                teacher,
                course_ids: Vec::new(),
            })
        });

        log_outcome(
            "teacher_create",
            format_args!(
                "teacher_id={:?}",
                result.as_ref().ok().map(|view| view.teacher.id)
            ),
            &result,
        );
        result
    }

    pub fn update_teacher(
        &self,
        caller: &Caller,
        teacher_id: TeacherId,
        input: &ProfileInput,
    ) -> ServiceResult<TeacherView> {
        let result = self.store.atomic(|store| -> ServiceResult<TeacherView> {
            require_teacher(store, teacher_id)?;
            authorize(caller, Operation::ManageTeachers, None)?;

            let updated = Teacher {
                id: teacher_id,
                name: input.name.clone(),
                email: input.email.clone(),
            };
            store.update_teacher(&updated)?;
            teacher_view(store, updated)
        });

        log_outcome(
            "teacher_update",
            format_args!("teacher_id={teacher_id}"),
            &result,
        );
        result
    }

    /// Deletes a teacher. Courses it taught stay, without a teacher.
    pub fn delete_teacher(&self, caller: &Caller, teacher_id: TeacherId) -> ServiceResult<()> {
        let result = self.store.atomic(|store| -> ServiceResult<usize> {
            require_teacher(store, teacher_id)?;
            authorize(caller, Operation::ManageTeachers, None)?;

            let detached = store.detach_teacher_from_courses(teacher_id)?;
            store.clear_role_profile(Role::Teacher, teacher_id)?;
            store.delete_teacher(teacher_id)?;
            Ok(detached)
        });

        log_outcome(
            "teacher_delete",
            format_args!(
                "teacher_id={teacher_id} detached_courses={}",
                result.as_ref().map_or(0, |count| *count)
            ),
            &result,
        );
        result.map(|_| ())
    }

    pub fn get_teacher(&self, teacher_id: TeacherId) -> ServiceResult<TeacherView> {
        self.store.read_snapshot(|store| -> ServiceResult<TeacherView> {
            let teacher = require_teacher(store, teacher_id)?;
            teacher_view(store, teacher)
        })
    }

    pub fn list_teachers(&self) -> ServiceResult<Vec<TeacherView>> {
        self.store.read_snapshot(|store| -> ServiceResult<Vec<TeacherView>> {
            store
                .list_teachers()?
                .into_iter()
                .map(|teacher| teacher_view(store, teacher))
                .collect()
        })
    }
}
