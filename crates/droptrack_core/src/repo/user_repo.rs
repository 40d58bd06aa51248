//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide account CRUD over the `users` table.
//! - Own the account/drop-off delete cascade in one transaction.
//!
//! # Invariants
//! - Write paths call `User::validate()` before SQL mutations.
//! - `phone_number` lookups hit the unique normalized column.
//! - `delete_user_with_dropoffs` removes the account and its records
//!   atomically or not at all.

use crate::model::user::{User, UserId};
use crate::repo::{
    bool_to_int, instant_from_us, instant_to_us, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT
    id,
    phone_number,
    password_hash,
    created_at_us,
    is_admin
FROM users";

/// Repository interface for account operations.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_phone(&self, phone_number: &str) -> RepoResult<Option<User>>;
    /// Lists accounts ordered by registration instant, newest first.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn set_password_hash(&self, id: UserId, password_hash: &str) -> RepoResult<()>;
    fn set_admin(&self, id: UserId, is_admin: bool) -> RepoResult<()>;
    /// Deletes the account together with every drop-off it owns.
    fn delete_user_with_dropoffs(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (id, phone_number, password_hash, created_at_us, is_admin)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.phone_number.as_str(),
                user.password_hash.as_str(),
                instant_to_us(user.created_at),
                bool_to_int(user.is_admin),
            ],
        )?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_by_phone(&self, phone_number: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE phone_number = ?1;"))?;
        let mut rows = stmt.query(params![phone_number])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY created_at_us DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn set_password_hash(&self, id: UserId, password_hash: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2;",
            params![password_hash, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }

    fn set_admin(&self, id: UserId, is_admin: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_admin = ?1 WHERE id = ?2;",
            params![bool_to_int(is_admin), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }

    fn delete_user_with_dropoffs(&self, id: UserId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id_text = id.to_string();

        tx.execute("DELETE FROM dropoffs WHERE user_id = ?1;", params![id_text])?;
        let changed = tx.execute("DELETE FROM users WHERE id = ?1;", params![id_text])?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        tx.commit()?;
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "users.id")?;
    let created_at = instant_from_us(row.get::<_, i64>("created_at_us")?, "users.created_at_us")?;
    let is_admin = int_to_bool(row.get::<_, i64>("is_admin")?, "users.is_admin")?;

    let user = User {
        id,
        phone_number: row.get("phone_number")?,
        password_hash: row.get("password_hash")?,
        created_at,
        is_admin,
    };
    user.validate()?;
    Ok(user)
}
