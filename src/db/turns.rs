// Turn repository.
//
// No ordering validation happens here: the segmentation pipeline owns the
// correctness of `number` and the time bounds it writes.

use rusqlite::{params, Connection};

use crate::error::StoreError;

use super::models::Turn;
use super::Database;

impl Database {
    pub fn create_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        self.with_conn(|conn| insert(conn, turn))
    }

    /// All turns of a conversation, ordered by `number` ascending.
    pub fn list_turns(&self, conversation_id: &str) -> Result<Vec<Turn>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, number, speaker, text, start_ms, end_ms, audio_path \
                 FROM turns WHERE conversation_id = ? ORDER BY number ASC",
            )?;
            let rows = stmt.query_map(params![conversation_id], |row| {
                Ok(Turn {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    number: row.get(2)?,
                    speaker: row.get(3)?,
                    text: row.get(4)?,
                    start_ms: row.get(5)?,
                    end_ms: row.get(6)?,
                    audio_path: row.get(7)?,
                })
            })?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    /// Bulk removal, used during conversation deletion.
    pub fn delete_turns(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM turns WHERE conversation_id = ?",
                params![conversation_id],
            )?;
            Ok(())
        })
    }
}

/// Insert against a caller-provided connection so the segmentation pipeline
/// can write all turns in the same transaction as the conversation row.
pub(crate) fn insert(conn: &Connection, t: &Turn) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO turns \
         (id, conversation_id, number, speaker, text, start_ms, end_ms, audio_path) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            t.id,
            t.conversation_id,
            t.number,
            t.speaker,
            t.text,
            t.start_ms,
            t.end_ms,
            t.audio_path,
        ],
    )?;
    Ok(())
}
