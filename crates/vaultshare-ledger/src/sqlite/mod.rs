//! SQLite store backends
//!
//! Single `Mutex<Connection>` per store; version compare-and-swap is a
//! conditional `UPDATE ... WHERE version = ?` checked via `changes()`.

mod attempt;
mod audit;
mod directory;
mod identity;
pub(crate) mod schema;

pub use attempt::SqliteAttemptStore;
pub use audit::SqliteAuditLog;
pub use directory::SqliteDirectoryStore;
pub use identity::SqliteIdentityStore;
