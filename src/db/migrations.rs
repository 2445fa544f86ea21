use rusqlite::Connection;

use crate::error::StoreError;

const SCHEMA_VERSION: i32 = 1;

/// Bring the database schema up to date.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current = get_schema_version(conn)?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn migrate_v1(conn: &Connection) -> Result<(), StoreError> {
    tracing::info!("Running database migration v1");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per fully processed audio upload.
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY NOT NULL,
            fingerprint TEXT NOT NULL UNIQUE,
            filename TEXT NOT NULL,
            format TEXT NOT NULL,
            duration REAL NOT NULL,
            speakers INTEGER NOT NULL,
            turns INTEGER NOT NULL,
            processed_at TEXT NOT NULL,
            last_viewed TEXT NOT NULL,
            storage_path TEXT NOT NULL
        );

        -- One row per speaker turn, owned by a conversation.
        CREATE TABLE IF NOT EXISTS turns (
            id TEXT PRIMARY KEY NOT NULL,
            conversation_id TEXT NOT NULL,
            number INTEGER NOT NULL,
            speaker TEXT NOT NULL,
            text TEXT NOT NULL,
            start_ms INTEGER NOT NULL,
            end_ms INTEGER NOT NULL,
            audio_path TEXT NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_conversations_fingerprint
        ON conversations(fingerprint);

        CREATE INDEX IF NOT EXISTS idx_turns_conversation_number
        ON turns(conversation_id, number);

        INSERT INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}
