//! Teacher profile repository.

use crate::model::profile::{ProfileInput, Teacher, TeacherId};
use crate::repo::sqlite_store::{SqliteStore, TEACHERS};
use crate::repo::RepoResult;

/// Accessor contract for teacher profiles.
pub trait TeacherRepository {
    fn create_teacher(&self, input: &ProfileInput) -> RepoResult<Teacher>;
    fn update_teacher(&self, teacher: &Teacher) -> RepoResult<()>;
    fn get_teacher(&self, id: TeacherId) -> RepoResult<Option<Teacher>>;
    fn list_teachers(&self) -> RepoResult<Vec<Teacher>>;
    /// Removes the row. Courses it taught fall back to `teacher_id = NULL`.
    fn delete_teacher(&self, id: TeacherId) -> RepoResult<()>;
}

impl TeacherRepository for SqliteStore<'_> {
    fn create_teacher(&self, input: &ProfileInput) -> RepoResult<Teacher> {
        let id = TEACHERS.insert(self.conn, input)?;
        Ok(Teacher {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
        })
    }

    fn update_teacher(&self, teacher: &Teacher) -> RepoResult<()> {
        TEACHERS.update(
            self.conn,
            teacher.id,
            &teacher.name,
            teacher.email.as_deref(),
        )
    }

    fn get_teacher(&self, id: TeacherId) -> RepoResult<Option<Teacher>> {
        Ok(TEACHERS.get(self.conn, id)?.map(into_teacher))
    }

    fn list_teachers(&self) -> RepoResult<Vec<Teacher>> {
        Ok(TEACHERS
            .list(self.conn)?
            .into_iter()
            .map(into_teacher)
            .collect())
    }

    fn delete_teacher(&self, id: TeacherId) -> RepoResult<()> {
        TEACHERS.delete(self.conn, id)
    }
}

fn into_teacher((id, name, email): (i64, String, Option<String>)) -> Teacher {
    Teacher { id, name, email }
}
