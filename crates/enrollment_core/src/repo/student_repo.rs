//! Student profile repository.

use crate::model::profile::{ProfileInput, Student, StudentId};
use crate::repo::sqlite_store::{SqliteStore, STUDENTS};
use crate::repo::RepoResult;

/// Accessor contract for student profiles.
pub trait StudentRepository {
    fn create_student(&self, input: &ProfileInput) -> RepoResult<Student>;
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Removes the row. Enrollment edges go with it via `ON DELETE CASCADE`.
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
}

impl StudentRepository for SqliteStore<'_> {
    fn create_student(&self, input: &ProfileInput) -> RepoResult<Student> {
        let id = STUDENTS.insert(self.conn, input)?;
        Ok(Student {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
        })
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        STUDENTS.update(
            self.conn,
            student.id,
            &student.name,
            student.email.as_deref(),
        )
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        Ok(STUDENTS.get(self.conn, id)?.map(into_student))
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        Ok(STUDENTS
            .list(self.conn)?
            .into_iter()
            .map(into_student)
            .collect())
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        STUDENTS.delete(self.conn, id)
    }
}

fn into_student((id, name, email): (i64, String, Option<String>)) -> Student {
    Student { id, name, email }
}
