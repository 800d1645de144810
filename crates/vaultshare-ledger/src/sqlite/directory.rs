//! SQLite directory store

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use super::schema::{init_schema, now};
use crate::directory::{DirectoryRecord, DirectoryStore, VerificationStatus};
use crate::error::{LedgerError, LedgerResult};

/// SQLite-backed directory store
pub struct SqliteDirectoryStore {
    conn: Mutex<Connection>,
}

impl SqliteDirectoryStore {
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

    fn set_to_json(set: &BTreeSet<String>) -> LedgerResult<String> {
        serde_json::to_string(set).map_err(|e| LedgerError::Infrastructure(e.to_string()))
    }

    fn set_from_json(json: &str) -> LedgerResult<BTreeSet<String>> {
        serde_json::from_str(json).map_err(|e| LedgerError::Infrastructure(e.to_string()))
    }

    fn row_to_record(
        row: (String, String, Option<String>, String, String, String, i64),
    ) -> LedgerResult<DirectoryRecord> {
        let (key, owner, content_address, policy_json, coop_json, status, version) = row;
        let verification_status = VerificationStatus::parse(&status).ok_or_else(|| {
            LedgerError::Infrastructure(format!("unknown verification status {status:?}"))
        })?;
        Ok(DirectoryRecord {
            key,
            owner,
            content_address,
            access_policy: Self::set_from_json(&policy_json)?,
            cooperators: Self::set_from_json(&coop_json)?,
            verification_status,
            version: version as u64,
        })
    }
}

#[async_trait]
impl DirectoryStore for SqliteDirectoryStore {
    async fn insert(&self, record: DirectoryRecord) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();

        let existing: Option<String> = conn
            .query_row(
                "SELECT key FROM directories WHERE key = ?",
                [&record.key],
                |row| row.get(0),
            )
            .ok();
        if existing.is_some() {
            return Err(LedgerError::AlreadyExists(format!(
                "directory {}",
                record.key
            )));
        }

        conn.execute(
            r#"INSERT INTO directories
               (key, owner, content_address, access_policy, cooperators, verification_status, version, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            (
                &record.key,
                &record.owner,
                &record.content_address,
                Self::set_to_json(&record.access_policy)?,
                Self::set_to_json(&record.cooperators)?,
                record.verification_status.as_str(),
                record.version as i64,
                now(),
            ),
        )?;

        Ok(())
    }

    async fn get(&self, key: &str) -> LedgerResult<DirectoryRecord> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                r#"SELECT key, owner, content_address, access_policy, cooperators, verification_status, version
                   FROM directories WHERE key = ?"#,
                [key],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .ok();

        match row {
            Some(row) => Self::row_to_record(row),
            None => Err(LedgerError::NotFound(format!("directory {key}"))),
        }
    }

    async fn list(&self) -> LedgerResult<Vec<DirectoryRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"SELECT key, owner, content_address, access_policy, cooperators, verification_status, version
               FROM directories ORDER BY key"#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(Self::row_to_record(row?)?);
        }
        Ok(records)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: DirectoryRecord,
    ) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            r#"UPDATE directories
               SET content_address = ?, access_policy = ?, cooperators = ?,
                   verification_status = ?, version = ?
               WHERE key = ? AND version = ?"#,
            (
                &record.content_address,
                Self::set_to_json(&record.access_policy)?,
                Self::set_to_json(&record.cooperators)?,
                record.verification_status.as_str(),
                record.version as i64,
                &record.key,
                expected_version as i64,
            ),
        )?;
        if changed == 1 {
            return Ok(());
        }

        // Distinguish a stale version from a missing key
        let actual: Option<i64> = conn
            .query_row(
                "SELECT version FROM directories WHERE key = ?",
                [&record.key],
                |row| row.get(0),
            )
            .ok();
        match actual {
            Some(actual) => Err(LedgerError::VersionConflict {
                expected: expected_version,
                actual: actual as u64,
            }),
            None => Err(LedgerError::NotFound(format!("directory {}", record.key))),
        }
    }
}
