// Conversation repository.
//
// The fingerprint uniqueness invariant is enforced here at the storage
// layer (unique index), not just checked by callers before creating.

use rusqlite::{params, Connection, ErrorCode};

use crate::error::StoreError;

use super::models::Conversation;
use super::Database;

impl Database {
    /// Insert a conversation row. Fails with `FingerprintExists` when a row
    /// with the same fingerprint is already present.
    pub fn create_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.with_conn(|conn| insert(conn, conversation))
    }

    /// Single indexed lookup by content fingerprint.
    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Conversation>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM conversations WHERE fingerprint = ?"
            ))?;
            optional_row(stmt.query_row(params![fingerprint], row_to_conversation))
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM conversations WHERE id = ?"))?;
            optional_row(stmt.query_row(params![id], row_to_conversation))
        })
    }

    /// All conversations, most recently processed first.
    pub fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM conversations ORDER BY processed_at DESC"
            ))?;
            let rows = stmt.query_map([], row_to_conversation)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    /// Update `last_viewed` only. Errors with `NotFound` when the id
    /// matches no row, distinct from a successful update.
    pub fn touch_last_viewed(&self, id: &str, timestamp: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE conversations SET last_viewed = ? WHERE id = ?",
                params![timestamp, id],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("conversation {id}")));
            }
            Ok(())
        })
    }

    /// Remove the conversation row. Child turn rows and blobs are the
    /// caller's responsibility (see `commands::delete`); the schema-level
    /// cascade additionally covers the turn rows.
    pub fn delete_conversation(&self, id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM conversations WHERE id = ?", params![id])?;
            Ok(())
        })
    }
}

const COLUMNS: &str = "id, fingerprint, filename, format, duration, speakers, turns, \
                       processed_at, last_viewed, storage_path";

/// Insert against a caller-provided connection so the segmentation pipeline
/// can write the conversation and its turns in one transaction.
pub(crate) fn insert(conn: &Connection, c: &Conversation) -> Result<(), StoreError> {
    let result = conn.execute(
        "INSERT INTO conversations \
         (id, fingerprint, filename, format, duration, speakers, turns, \
          processed_at, last_viewed, storage_path) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            c.id,
            c.fingerprint,
            c.filename,
            c.format,
            c.duration,
            c.speakers,
            c.turns,
            c.processed_at,
            c.last_viewed,
            c.storage_path,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::FingerprintExists)
        }
        Err(e) => Err(e.into()),
    }
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        fingerprint: row.get(1)?,
        filename: row.get(2)?,
        format: row.get(3)?,
        duration: row.get(4)?,
        speakers: row.get(5)?,
        turns: row.get(6)?,
        processed_at: row.get(7)?,
        last_viewed: row.get(8)?,
        storage_path: row.get(9)?,
    })
}

fn optional_row(
    result: rusqlite::Result<Conversation>,
) -> Result<Option<Conversation>, StoreError> {
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
