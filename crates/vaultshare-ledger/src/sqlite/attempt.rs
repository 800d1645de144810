//! SQLite verification-attempt store

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use super::schema::{init_schema, now};
use crate::error::{LedgerError, LedgerResult};
use crate::verification::{
    AttemptId, AttemptOutcome, AttemptStore, ProofDigest, VerificationAttempt,
};

/// SQLite-backed attempt store
///
/// The `idx_attempts_pending` partial unique index enforces the
/// one-pending-per-key rule inside the database itself.
pub struct SqliteAttemptStore {
    conn: Mutex<Connection>,
}

impl SqliteAttemptStore {
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

    fn outcome_from_str(s: &str) -> LedgerResult<AttemptOutcome> {
        match s {
            "pending" => Ok(AttemptOutcome::Pending),
            "valid" => Ok(AttemptOutcome::Valid),
            "invalid" => Ok(AttemptOutcome::Invalid),
            other => Err(LedgerError::Infrastructure(format!(
                "unknown attempt outcome {other:?}"
            ))),
        }
    }

    fn row_to_attempt(
        row: (i64, String, Vec<u8>, String, i64, String),
    ) -> LedgerResult<VerificationAttempt> {
        let (id, key, digest, submitted_by, at_version, outcome) = row;
        let arr: [u8; 32] = digest
            .try_into()
            .map_err(|_| LedgerError::Infrastructure("proof digest must be 32 bytes".into()))?;
        Ok(VerificationAttempt {
            id: id as AttemptId,
            directory_key: key,
            proof_digest: ProofDigest::from_bytes(arr),
            submitted_by,
            submitted_at_version: at_version as u64,
            outcome: Self::outcome_from_str(&outcome)?,
        })
    }

    fn fetch(conn: &Connection, id: AttemptId) -> LedgerResult<VerificationAttempt> {
        let row = conn
            .query_row(
                r#"SELECT id, directory_key, proof_digest, submitted_by, submitted_at_version, outcome
                   FROM attempts WHERE id = ?"#,
                [id as i64],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .ok();

        match row {
            Some(row) => Self::row_to_attempt(row),
            None => Err(LedgerError::NotFound(format!("attempt {id}"))),
        }
    }
}

#[async_trait]
impl AttemptStore for SqliteAttemptStore {
    async fn insert(&self, attempt: VerificationAttempt) -> LedgerResult<VerificationAttempt> {
        let conn = self.conn.lock().unwrap();

        let result = conn.execute(
            r#"INSERT INTO attempts
               (directory_key, proof_digest, submitted_by, submitted_at_version, outcome, created_at)
               VALUES (?, ?, ?, ?, 'pending', ?)"#,
            (
                &attempt.directory_key,
                attempt.proof_digest.as_bytes().as_slice(),
                &attempt.submitted_by,
                attempt.submitted_at_version as i64,
                now(),
            ),
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid() as AttemptId;
                let mut stored = attempt;
                stored.id = id;
                stored.outcome = AttemptOutcome::Pending;
                Ok(stored)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::AlreadyPending(attempt.directory_key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: AttemptId) -> LedgerResult<VerificationAttempt> {
        let conn = self.conn.lock().unwrap();
        Self::fetch(&conn, id)
    }

    async fn finalize(
        &self,
        id: AttemptId,
        outcome: AttemptOutcome,
    ) -> LedgerResult<(VerificationAttempt, bool)> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            "UPDATE attempts SET outcome = ? WHERE id = ? AND outcome = 'pending'",
            (outcome.as_str(), id as i64),
        )?;

        let attempt = Self::fetch(&conn, id)?;
        Ok((attempt, changed == 1))
    }

    async fn pending_for(&self, key: &str) -> LedgerResult<Option<VerificationAttempt>> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                r#"SELECT id, directory_key, proof_digest, submitted_by, submitted_at_version, outcome
                   FROM attempts WHERE directory_key = ? AND outcome = 'pending'"#,
                [key],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .ok();

        row.map(Self::row_to_attempt).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(key: &str) -> VerificationAttempt {
        VerificationAttempt {
            id: 0,
            directory_key: key.into(),
            proof_digest: ProofDigest::compute(b"proof", b"inputs"),
            submitted_by: "alice".into(),
            submitted_at_version: 1,
            outcome: AttemptOutcome::Pending,
        }
    }

    #[tokio::test]
    async fn test_sqlite_attempt_roundtrip() {
        let store = SqliteAttemptStore::in_memory().unwrap();
        let stored = store.insert(attempt("f1")).await.unwrap();
        assert!(stored.id > 0);

        let got = store.get(stored.id).await.unwrap();
        assert_eq!(got.proof_digest, stored.proof_digest);
        assert_eq!(got.outcome, AttemptOutcome::Pending);
    }

    #[tokio::test]
    async fn test_sqlite_pending_unique() {
        let store = SqliteAttemptStore::in_memory().unwrap();
        store.insert(attempt("f1")).await.unwrap();

        let result = store.insert(attempt("f1")).await;
        assert!(matches!(result, Err(LedgerError::AlreadyPending(_))));

        // A different key is unaffected
        store.insert(attempt("f2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_finalize_once() {
        let store = SqliteAttemptStore::in_memory().unwrap();
        let stored = store.insert(attempt("f1")).await.unwrap();

        let (settled, newly) = store
            .finalize(stored.id, AttemptOutcome::Valid)
            .await
            .unwrap();
        assert!(newly);
        assert_eq!(settled.outcome, AttemptOutcome::Valid);

        let (settled, newly) = store
            .finalize(stored.id, AttemptOutcome::Invalid)
            .await
            .unwrap();
        assert!(!newly);
        assert_eq!(settled.outcome, AttemptOutcome::Valid);

        assert!(store.pending_for("f1").await.unwrap().is_none());
    }
}
