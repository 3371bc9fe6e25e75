//! Identity repository.
//!
//! # Invariants
//! - Emails are stored normalized (trimmed, lowercase) and compared with
//!   `COLLATE NOCASE`.
//! - Lookups by username are exact.

use crate::model::user::{normalize_email, NewUser, Role, User, UserId};
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::{EntityKind, RepoError, RepoResult};
use rusqlite::{params, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    name,
    credential_hash,
    role,
    role_specific_id
FROM users";

/// Accessor contract for identities.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn find_user_by_username_and_role(
        &self,
        username: &str,
        role: Role,
    ) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    fn exists_by_username(&self, username: &str) -> RepoResult<bool>;
    /// Nulls `role_specific_id` on users linked to the given profile.
    /// Returns the number of users touched.
    fn clear_role_profile(&self, role: Role, profile_id: i64) -> RepoResult<usize>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let email = normalize_email(&user.email);
        self.conn.execute(
            "INSERT INTO users (
                username,
                email,
                name,
                credential_hash,
                role,
                role_specific_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.username.as_str(),
                email.as_str(),
                user.name.as_str(),
                user.credential_hash.as_str(),
                user.role.as_str(),
                user.role_specific_id,
            ],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: user.username.clone(),
            email,
            name: user.name.clone(),
            credential_hash: user.credential_hash.clone(),
            role: user.role,
            role_specific_id: user.role_specific_id,
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_user(&format!("{USER_SELECT_SQL} WHERE id = ?1;"), params![id])
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.query_user(
            &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
            params![username],
        )
    }

    fn find_user_by_username_and_role(
        &self,
        username: &str,
        role: Role,
    ) -> RepoResult<Option<User>> {
        self.query_user(
            &format!("{USER_SELECT_SQL} WHERE username = ?1 AND role = ?2;"),
            params![username, role.as_str()],
        )
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE);",
            [normalize_email(email)],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn exists_by_username(&self, username: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [username],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn clear_role_profile(&self, role: Role, profile_id: i64) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE users SET role_specific_id = NULL WHERE role = ?1 AND role_specific_id = ?2;",
            params![role.as_str(), profile_id],
        )?;
        Ok(changed)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id,
            });
        }
        Ok(())
    }
}

impl SqliteStore<'_> {
    fn query_user(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let role_text: String = row.get("role")?;
    let role = role_text
        .parse::<Role>()
        .map_err(|_| RepoError::InvalidData(format!("invalid role `{role_text}` in users.role")))?;

    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        name: row.get("name")?,
        credential_hash: row.get("credential_hash")?,
        role,
        role_specific_id: row.get("role_specific_id")?,
    })
}
