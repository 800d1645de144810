//! SQLite identity store

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use super::schema::{init_schema, now};
use crate::error::{LedgerError, LedgerResult};
use crate::identity::{CredentialCommitment, Identity, IdentityStore};

/// SQLite-backed identity store
pub struct SqliteIdentityStore {
    conn: Mutex<Connection>,
}

impl SqliteIdentityStore {
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

fn row_to_identity(
    id: String,
    display_name: String,
    commitment: Vec<u8>,
    group_tag: String,
) -> Option<Identity> {
    let arr: [u8; 32] = commitment.try_into().ok()?;
    Some(Identity {
        id,
        display_name,
        credential_commitment: CredentialCommitment::from_bytes(arr),
        group_tag,
    })
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn insert(&self, identity: Identity) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM identities WHERE id = ?",
                [&identity.id],
                |row| row.get(0),
            )
            .ok();
        if existing.is_some() {
            return Err(LedgerError::AlreadyExists(format!(
                "identity {}",
                identity.id
            )));
        }

        conn.execute(
            r#"INSERT INTO identities (id, display_name, credential_commitment, group_tag, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            (
                &identity.id,
                &identity.display_name,
                identity.credential_commitment.as_bytes().as_slice(),
                &identity.group_tag,
                now(),
            ),
        )?;

        Ok(())
    }

    async fn get(&self, id: &str) -> LedgerResult<Identity> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String, Vec<u8>, String)> = conn
            .query_row(
                "SELECT id, display_name, credential_commitment, group_tag FROM identities WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .ok();

        row.and_then(|(id, name, commitment, tag)| row_to_identity(id, name, commitment, tag))
            .ok_or_else(|| LedgerError::NotFound(format!("identity {id}")))
    }

    async fn update(&self, identity: Identity) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            "UPDATE identities SET display_name = ?, group_tag = ? WHERE id = ?",
            (&identity.display_name, &identity.group_tag, &identity.id),
        )?;
        if changed == 0 {
            return Err(LedgerError::NotFound(format!("identity {}", identity.id)));
        }

        Ok(())
    }
}
