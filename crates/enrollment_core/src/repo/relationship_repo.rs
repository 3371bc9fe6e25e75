//! Relationship edge repository.
//!
//! # Responsibility
//! - Persist the authoritative Course <-> Student edge set
//!   (`course_enrollments`) and Course -> Teacher edge (`courses.teacher_id`).
//! - Answer mirror queries (a student's courses, a teacher's courses) by
//!   reading those edges; no mirror is ever stored.
//!
//! # Invariants
//! - Writes here perform no capacity or ownership checks; the enrollment
//!   service runs them inside `EntityStore::atomic` before writing.

use crate::model::course::CourseId;
use crate::model::profile::{StudentId, TeacherId};
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::{EntityKind, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Edge accessor contract.
pub trait RelationshipRepository {
    /// Students enrolled in the course, ascending by id.
    fn enrolled_student_ids(&self, course_id: CourseId) -> RepoResult<Vec<StudentId>>;
    /// Courses the student is enrolled in, ascending by id.
    fn enrolled_course_ids(&self, student_id: StudentId) -> RepoResult<Vec<CourseId>>;
    /// Courses taught by the teacher, ascending by id.
    fn taught_course_ids(&self, teacher_id: TeacherId) -> RepoResult<Vec<CourseId>>;
    fn count_taught_courses(&self, teacher_id: TeacherId) -> RepoResult<usize>;
    /// Adds one edge. Inserting an existing edge is a no-op.
    fn insert_enrollment(&self, course_id: CourseId, student_id: StudentId) -> RepoResult<()>;
    /// Removes one edge. Returns whether it existed.
    fn delete_enrollment(&self, course_id: CourseId, student_id: StudentId) -> RepoResult<bool>;
    /// Sets or clears the course's teacher.
    fn set_course_teacher(
        &self,
        course_id: CourseId,
        teacher_id: Option<TeacherId>,
    ) -> RepoResult<()>;
    /// Removes every enrollment of the course, returning the count removed.
    fn clear_course_enrollments(&self, course_id: CourseId) -> RepoResult<usize>;
    /// Removes every enrollment of the student, returning the count removed.
    fn clear_student_enrollments(&self, student_id: StudentId) -> RepoResult<usize>;
    /// Clears the teacher of every course it teaches, returning the count.
    fn detach_teacher_from_courses(&self, teacher_id: TeacherId) -> RepoResult<usize>;
}

impl RelationshipRepository for SqliteStore<'_> {
    fn enrolled_student_ids(&self, course_id: CourseId) -> RepoResult<Vec<StudentId>> {
        query_ids(
            self.conn,
            "SELECT student_id FROM course_enrollments WHERE course_id = ?1 ORDER BY student_id;",
            course_id,
        )
    }

    fn enrolled_course_ids(&self, student_id: StudentId) -> RepoResult<Vec<CourseId>> {
        query_ids(
            self.conn,
            "SELECT course_id FROM course_enrollments WHERE student_id = ?1 ORDER BY course_id;",
            student_id,
        )
    }

    fn taught_course_ids(&self, teacher_id: TeacherId) -> RepoResult<Vec<CourseId>> {
        query_ids(
            self.conn,
            "SELECT id FROM courses WHERE teacher_id = ?1 ORDER BY id;",
            teacher_id,
        )
    }

    fn count_taught_courses(&self, teacher_id: TeacherId) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM courses WHERE teacher_id = ?1;",
            [teacher_id],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative course count `{count}`")))
    }

    fn insert_enrollment(&self, course_id: CourseId, student_id: StudentId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO course_enrollments (course_id, student_id) VALUES (?1, ?2);",
            params![course_id, student_id],
        )?;
        Ok(())
    }

    fn delete_enrollment(&self, course_id: CourseId, student_id: StudentId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM course_enrollments WHERE course_id = ?1 AND student_id = ?2;",
            params![course_id, student_id],
        )?;
        Ok(changed > 0)
    }

    fn set_course_teacher(
        &self,
        course_id: CourseId,
        teacher_id: Option<TeacherId>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE courses SET teacher_id = ?1 WHERE id = ?2;",
            params![teacher_id, course_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Course,
                id: course_id,
            });
        }
        Ok(())
    }

    fn clear_course_enrollments(&self, course_id: CourseId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM course_enrollments WHERE course_id = ?1;",
            [course_id],
        )?;
        Ok(removed)
    }

    fn clear_student_enrollments(&self, student_id: StudentId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM course_enrollments WHERE student_id = ?1;",
            [student_id],
        )?;
        Ok(removed)
    }

    fn detach_teacher_from_courses(&self, teacher_id: TeacherId) -> RepoResult<usize> {
        let detached = self.conn.execute(
            "UPDATE courses SET teacher_id = NULL WHERE teacher_id = ?1;",
            [teacher_id],
        )?;
        Ok(detached)
    }
}

fn query_ids(conn: &Connection, sql: &str, key: i64) -> RepoResult<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([key], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}
