//! SQLite-backed entity store.
//!
//! # Invariants
//! - Constructed only over a migrated connection (`db::open_db*`).
//! - `atomic` opens an `IMMEDIATE` transaction: the write lock is taken
//!   before the first read, so check-then-act sequences from different
//!   connections are serialized.

use crate::db::migrations::latest_version;
use crate::model::profile::ProfileInput;
use crate::repo::{EntityKind, EntityStore, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Entity store over one SQLite connection.
///
/// One connection serves one thread; concurrent callers each open their own
/// connection to the same database file.
pub struct SqliteStore<'conn> {
    pub(crate) conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntityStore for SqliteStore<'_> {
    fn atomic<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        // Dropping `tx` on the error path rolls back.
        let value = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }

    fn read_snapshot<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        // The shared lock taken by the first read is held until the
        // transaction ends.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)
            .map_err(RepoError::from)?;
        let value = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Converts a stored capacity into the model type.
pub(crate) fn capacity_from_db(value: i64) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid max_students `{value}` in courses.max_students"))
    })
}

/// Profile tables share one shape: `(id, name, email)`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProfileTable {
    pub(crate) table: &'static str,
    pub(crate) entity: EntityKind,
}

pub(crate) const STUDENTS: ProfileTable = ProfileTable {
    table: "students",
    entity: EntityKind::Student,
};

pub(crate) const TEACHERS: ProfileTable = ProfileTable {
    table: "teachers",
    entity: EntityKind::Teacher,
};

/// Raw `(id, name, email)` profile row.
pub(crate) type ProfileRow = (i64, String, Option<String>);

impl ProfileTable {
    pub(crate) fn insert(&self, conn: &Connection, input: &ProfileInput) -> RepoResult<i64> {
        conn.execute(
            &format!("INSERT INTO {} (name, email) VALUES (?1, ?2);", self.table),
            params![input.name.as_str(), input.email.as_deref()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub(crate) fn update(
        &self,
        conn: &Connection,
        id: i64,
        name: &str,
        email: Option<&str>,
    ) -> RepoResult<()> {
        let changed = conn.execute(
            &format!("UPDATE {} SET name = ?1, email = ?2 WHERE id = ?3;", self.table),
            params![name, email, id],
        )?;
        self.expect_changed(changed, id)
    }

    pub(crate) fn get(&self, conn: &Connection, id: i64) -> RepoResult<Option<ProfileRow>> {
        let row = conn
            .query_row(
                &format!("SELECT id, name, email FROM {} WHERE id = ?1;", self.table),
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub(crate) fn list(&self, conn: &Connection) -> RepoResult<Vec<ProfileRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, email FROM {} ORDER BY id ASC;",
            self.table
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<ProfileRow>>>()?;
        Ok(rows)
    }

    pub(crate) fn delete(&self, conn: &Connection, id: i64) -> RepoResult<()> {
        let changed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1;", self.table), [id])?;
        self.expect_changed(changed, id)
    }

    fn expect_changed(&self, changed: usize, id: i64) -> RepoResult<()> {
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: self.entity,
                id,
            });
        }
        Ok(())
    }
}
