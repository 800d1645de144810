//! SQLite audit log

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use super::schema::{init_schema, now};
use crate::audit::{AuditEntry, AuditEvent, AuditLog};
use crate::error::LedgerResult;

/// SQLite-backed audit log
///
/// Sequence numbers come from the rowid, so the total order survives a
/// restart together with the records it describes.
pub struct SqliteAuditLog {
    conn: Mutex<Connection>,
}

impl SqliteAuditLog {
    /// Open or create a database at the given path
    pub fn open(path: &str) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl AuditLog for SqliteAuditLog {
    async fn append(&self, event: AuditEvent) -> LedgerResult<u64> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"INSERT INTO audit_entries
               (operation, subject, actor, resulting_version, detail, recorded_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            (
                &event.operation,
                &event.subject,
                &event.actor,
                event.resulting_version.map(|v| v as i64),
                &event.detail,
                now(),
            ),
        )?;

        Ok(conn.last_insert_rowid() as u64)
    }

    async fn entries_for(&self, subject: &str) -> LedgerResult<Vec<AuditEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"SELECT seq, operation, subject, actor, resulting_version, detail, recorded_at
               FROM audit_entries WHERE subject = ? ORDER BY seq"#,
        )?;
        let rows = stmt.query_map([subject], |row| {
            let resulting_version: Option<i64> = row.get(4)?;
            Ok(AuditEntry {
                seq: row.get::<_, i64>(0)? as u64,
                recorded_at: row.get::<_, i64>(6)? as u64,
                event: AuditEvent {
                    operation: row.get(1)?,
                    subject: row.get(2)?,
                    actor: row.get(3)?,
                    resulting_version: resulting_version.map(|v| v as u64),
                    detail: row.get(5)?,
                },
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    async fn len(&self) -> LedgerResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_entries", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }
}
