//! Course repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Course::validate()` / `validate_capacity` first.
//! - `update_course` writes scalar fields only; the teacher edge is owned
//!   by `RelationshipRepository::set_course_teacher`.

use crate::model::course::{validate_capacity, Course, CourseId};
use crate::repo::sqlite_store::{capacity_from_db, SqliteStore};
use crate::repo::{EntityKind, RepoError, RepoResult};
use rusqlite::{params, OptionalExtension, Row};

const COURSE_SELECT_SQL: &str = "SELECT id, name, max_students, teacher_id FROM courses";

/// Accessor contract for courses.
pub trait CourseRepository {
    /// Inserts a teacher-less course and returns it with its assigned id.
    fn create_course(&self, name: &str, max_students: u32) -> RepoResult<Course>;
    /// Writes `name` and `max_students`.
    fn update_course(&self, course: &Course) -> RepoResult<()>;
    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>>;
    /// Lists courses ordered by id.
    fn list_courses(&self) -> RepoResult<Vec<Course>>;
    fn delete_course(&self, id: CourseId) -> RepoResult<()>;
}

impl CourseRepository for SqliteStore<'_> {
    fn create_course(&self, name: &str, max_students: u32) -> RepoResult<Course> {
        validate_capacity(max_students)?;

        self.conn.execute(
            "INSERT INTO courses (name, max_students) VALUES (?1, ?2);",
            params![name, i64::from(max_students)],
        )?;

        Ok(Course {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            max_students,
            teacher_id: None,
        })
    }

    fn update_course(&self, course: &Course) -> RepoResult<()> {
        course.validate()?;

        let changed = self.conn.execute(
            "UPDATE courses SET name = ?1, max_students = ?2 WHERE id = ?3;",
            params![
                course.name.as_str(),
                i64::from(course.max_students),
                course.id
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Course,
                id: course.id,
            });
        }
        Ok(())
    }

    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>> {
        self.conn
            .query_row(
                &format!("{COURSE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                raw_course,
            )
            .optional()?
            .map(RawCourse::into_course)
            .transpose()
    }

    fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COURSE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(raw_course(row)?.into_course()?);
        }
        Ok(courses)
    }

    fn delete_course(&self, id: CourseId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM courses WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Course,
                id,
            });
        }
        Ok(())
    }
}

struct RawCourse {
    id: CourseId,
    name: String,
    max_students: i64,
    teacher_id: Option<i64>,
}

impl RawCourse {
    fn into_course(self) -> RepoResult<Course> {
        let course = Course {
            id: self.id,
            name: self.name,
            max_students: capacity_from_db(self.max_students)?,
            teacher_id: self.teacher_id,
        };
        course.validate()?;
        Ok(course)
    }
}

fn raw_course(row: &Row<'_>) -> rusqlite::Result<RawCourse> {
    Ok(RawCourse {
        id: row.get("id")?,
        name: row.get("name")?,
        max_students: row.get("max_students")?,
        teacher_id: row.get("teacher_id")?,
    })
}
