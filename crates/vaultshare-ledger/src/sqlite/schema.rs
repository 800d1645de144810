//! SQLite schema definitions

use rusqlite::Connection;

use crate::error::LedgerResult;

pub const SCHEMA_VERSION: u32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        -- Identity records
        CREATE TABLE IF NOT EXISTS identities (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            credential_commitment BLOB NOT NULL,   -- 32 bytes Blake3
            group_tag TEXT NOT NULL,
            created_at INTEGER NOT NULL            -- Unix timestamp
        );

        -- Directory records
        CREATE TABLE IF NOT EXISTS directories (
            key TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            content_address TEXT,
            access_policy TEXT NOT NULL,           -- JSON array of tags
            cooperators TEXT NOT NULL,             -- JSON array of identity ids
            verification_status TEXT NOT NULL,
            version INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_directories_owner
            ON directories(owner);

        -- Verification attempts
        CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            directory_key TEXT NOT NULL,
            proof_digest BLOB NOT NULL,            -- 32 bytes Blake3
            submitted_by TEXT NOT NULL,
            submitted_at_version INTEGER NOT NULL,
            outcome TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_attempts_key
            ON attempts(directory_key);

        -- At most one open attempt per directory key
        CREATE UNIQUE INDEX IF NOT EXISTS idx_attempts_pending
            ON attempts(directory_key) WHERE outcome = 'pending';

        -- Audit trail
        CREATE TABLE IF NOT EXISTS audit_entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            operation TEXT NOT NULL,
            subject TEXT NOT NULL,
            actor TEXT NOT NULL,
            resulting_version INTEGER,
            detail TEXT NOT NULL,
            recorded_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_subject
            ON audit_entries(subject);
    "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (version) VALUES (?)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Check schema version
#[allow(dead_code)]
pub fn check_version(conn: &Connection) -> LedgerResult<u32> {
    let version: u32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);
    Ok(version)
}

pub(crate) fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let version = check_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
