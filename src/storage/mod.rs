//! SQLite storage layer -- schema, per-meeting attendance logs.

pub mod schema;

use anyhow::{Context, Result};
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;
use std::path::Path;

use crate::attendance::AttendanceLog;

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &Path) -> Result<Pool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// In-memory database behind a single-connection pool (every new in-memory
/// connection would otherwise be a separate database).
pub fn open_memory_pool() -> Result<Pool> {
    let pool = R2D2Pool::builder()
        .max_size(1)
        .build(SqliteConnectionManager::memory())?;
    let conn = pool.get()?;
    schema::migrate(&conn)?;
    Ok(pool)
}

/// Load the stored log for `meeting_id`; empty if none was saved yet.
pub fn load_log(pool: &Pool, meeting_id: &str) -> Result<AttendanceLog> {
    let conn = pool.get()?;
    let json: Option<String> = conn
        .query_row(
            "SELECT records_json FROM attendance_logs WHERE meeting_id = ?1",
            rusqlite::params![meeting_id],
            |row| row.get(0),
        )
        .optional()?;

    match json {
        Some(json) => AttendanceLog::from_json(&json)
            .with_context(|| format!("corrupt attendance log for meeting {}", meeting_id)),
        None => Ok(AttendanceLog::new()),
    }
}

/// Overwrite the stored log for `meeting_id`.
pub fn save_log(pool: &Pool, meeting_id: &str, log: &AttendanceLog) -> Result<()> {
    let conn = pool.get()?;
    let json = log.to_json()?;
    conn.execute(
        "INSERT INTO attendance_logs (meeting_id, records_json, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(meeting_id) DO UPDATE SET
            records_json = excluded.records_json,
            updated_at = excluded.updated_at",
        rusqlite::params![meeting_id, json],
    )
    .context("Failed to save attendance log")?;
    Ok(())
}

/// Meeting ids with a stored log, most recently updated first.
pub fn list_meetings(pool: &Pool) -> Result<Vec<(String, usize)>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT meeting_id, records_json FROM attendance_logs ORDER BY updated_at DESC, meeting_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut list = Vec::new();
    for r in rows {
        let (id, json) = r?;
        let count = AttendanceLog::from_json(&json).map(|l| l.len()).unwrap_or(0);
        list.push((id, count));
    }
    Ok(list)
}
