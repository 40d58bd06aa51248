//! Drop-off repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide record CRUD over the `dropoffs` table.
//! - Execute UTC-window range filters computed by the local-time core.
//! - Join owner phone numbers for admin/report reads.
//!
//! # Invariants
//! - Write paths call `Dropoff::validate()` before SQL mutations.
//! - Window filters are inclusive on both ends
//!   (`dropped_at_us >= start AND dropped_at_us <= end`).
//! - Owner-scoped operations never touch another user's records.

use crate::localtime::UtcWindow;
use crate::model::dropoff::{Dropoff, DropoffId};
use crate::model::user::UserId;
use crate::repo::{instant_from_us, instant_to_us, parse_uuid, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;

const DROPOFF_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    tracking_number,
    dropped_at_us
FROM dropoffs";

const DROPOFF_OWNER_SELECT_SQL: &str = "SELECT
    dropoffs.id,
    dropoffs.user_id,
    dropoffs.tracking_number,
    dropoffs.dropped_at_us,
    users.phone_number AS owner_phone
FROM dropoffs
JOIN users ON users.id = dropoffs.user_id";

/// Admin search filter; unset fields leave that bound open.
#[derive(Debug, Clone, Default)]
pub struct DropoffSearchFilter {
    /// Case-insensitive substring match on the owner's phone number.
    pub phone_contains: Option<String>,
    /// Inclusive lower UTC bound.
    pub window_start: Option<DateTime<Utc>>,
    /// Inclusive upper UTC bound.
    pub window_end: Option<DateTime<Utc>>,
}

/// Read model joining a record with its owner's phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropoffWithOwner {
    pub record: Dropoff,
    pub owner_phone: String,
}

/// Repository interface for drop-off record operations.
pub trait DropoffRepository {
    fn create_dropoff(&self, record: &Dropoff) -> RepoResult<DropoffId>;
    fn get_dropoff(&self, id: DropoffId) -> RepoResult<Option<Dropoff>>;
    /// Gets a record only when it is owned by the given user.
    fn get_dropoff_for_user(&self, id: DropoffId, user_id: UserId) -> RepoResult<Option<Dropoff>>;
    fn tracking_number_exists_for_user(
        &self,
        user_id: UserId,
        tracking_number: &str,
    ) -> RepoResult<bool>;
    /// True when any *other* record already carries this tracking number.
    fn tracking_number_exists_elsewhere(
        &self,
        tracking_number: &str,
        excluding: DropoffId,
    ) -> RepoResult<bool>;
    fn update_tracking_number(&self, id: DropoffId, tracking_number: &str) -> RepoResult<()>;
    /// Deletes a record only when it is owned by the given user.
    fn delete_dropoff_for_user(&self, id: DropoffId, user_id: UserId) -> RepoResult<()>;
    /// Lists a user's records, newest first.
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Dropoff>>;
    /// Lists a user's records inside an inclusive UTC window, oldest first.
    fn list_for_user_in_window(
        &self,
        user_id: UserId,
        window: UtcWindow,
    ) -> RepoResult<Vec<Dropoff>>;
    /// Lists every record with its owner's phone, newest first.
    fn list_all_with_owner(&self) -> RepoResult<Vec<DropoffWithOwner>>;
    /// Admin search across all records, newest first.
    fn search_with_owner(&self, filter: &DropoffSearchFilter) -> RepoResult<Vec<DropoffWithOwner>>;
}

/// SQLite-backed drop-off repository.
pub struct SqliteDropoffRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDropoffRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DropoffRepository for SqliteDropoffRepository<'_> {
    fn create_dropoff(&self, record: &Dropoff) -> RepoResult<DropoffId> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO dropoffs (id, user_id, tracking_number, dropped_at_us)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                record.id.to_string(),
                record.user_id.to_string(),
                record.tracking_number.as_str(),
                instant_to_us(record.dropped_at),
            ],
        )?;

        Ok(record.id)
    }

    fn get_dropoff(&self, id: DropoffId) -> RepoResult<Option<Dropoff>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DROPOFF_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_dropoff_row(row)?));
        }
        Ok(None)
    }

    fn get_dropoff_for_user(&self, id: DropoffId, user_id: UserId) -> RepoResult<Option<Dropoff>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DROPOFF_SELECT_SQL} WHERE id = ?1 AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_dropoff_row(row)?));
        }
        Ok(None)
    }

    fn tracking_number_exists_for_user(
        &self,
        user_id: UserId,
        tracking_number: &str,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM dropoffs WHERE user_id = ?1 AND tracking_number = ?2
            );",
            params![user_id.to_string(), tracking_number],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn tracking_number_exists_elsewhere(
        &self,
        tracking_number: &str,
        excluding: DropoffId,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM dropoffs WHERE tracking_number = ?1 AND id != ?2
            );",
            params![tracking_number, excluding.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn update_tracking_number(&self, id: DropoffId, tracking_number: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE dropoffs SET tracking_number = ?1 WHERE id = ?2;",
            params![tracking_number, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::DropoffNotFound(id));
        }
        Ok(())
    }

    fn delete_dropoff_for_user(&self, id: DropoffId, user_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM dropoffs WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::DropoffNotFound(id));
        }
        Ok(())
    }

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Dropoff>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DROPOFF_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY dropped_at_us DESC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_dropoff_row(row)?);
        }
        Ok(records)
    }

    fn list_for_user_in_window(
        &self,
        user_id: UserId,
        window: UtcWindow,
    ) -> RepoResult<Vec<Dropoff>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DROPOFF_SELECT_SQL}
             WHERE user_id = ?1
               AND dropped_at_us >= ?2
               AND dropped_at_us <= ?3
             ORDER BY dropped_at_us ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            instant_to_us(window.start),
            instant_to_us(window.end),
        ])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_dropoff_row(row)?);
        }
        Ok(records)
    }

    fn list_all_with_owner(&self) -> RepoResult<Vec<DropoffWithOwner>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DROPOFF_OWNER_SELECT_SQL}
             ORDER BY dropoffs.dropped_at_us DESC, dropoffs.id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_dropoff_owner_row(row)?);
        }
        Ok(records)
    }

    fn search_with_owner(&self, filter: &DropoffSearchFilter) -> RepoResult<Vec<DropoffWithOwner>> {
        let mut sql = format!("{DROPOFF_OWNER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(phone) = filter
            .phone_contains
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            sql.push_str(" AND instr(lower(users.phone_number), lower(?)) > 0");
            bind_values.push(Value::Text(phone.to_string()));
        }

        if let Some(start) = filter.window_start {
            sql.push_str(" AND dropoffs.dropped_at_us >= ?");
            bind_values.push(Value::Integer(instant_to_us(start)));
        }

        if let Some(end) = filter.window_end {
            sql.push_str(" AND dropoffs.dropped_at_us <= ?");
            bind_values.push(Value::Integer(instant_to_us(end)));
        }

        sql.push_str(" ORDER BY dropoffs.dropped_at_us DESC, dropoffs.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_dropoff_owner_row(row)?);
        }
        Ok(records)
    }
}

fn parse_dropoff_row(row: &Row<'_>) -> RepoResult<Dropoff> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "dropoffs.id")?;
    let user_id = parse_uuid(&row.get::<_, String>("user_id")?, "dropoffs.user_id")?;
    let dropped_at = instant_from_us(
        row.get::<_, i64>("dropped_at_us")?,
        "dropoffs.dropped_at_us",
    )?;

    let record = Dropoff {
        id,
        user_id,
        tracking_number: row.get("tracking_number")?,
        dropped_at,
    };
    record.validate()?;
    Ok(record)
}

fn parse_dropoff_owner_row(row: &Row<'_>) -> RepoResult<DropoffWithOwner> {
    let record = parse_dropoff_row(row)?;
    Ok(DropoffWithOwner {
        record,
        owner_phone: row.get("owner_phone")?,
    })
}
