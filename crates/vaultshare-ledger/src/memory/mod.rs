//! In-memory store backends
//!
//! Thread-safe via `RwLock`; version checks happen inside the write lock
//! so compare-and-swap is atomic. Not persistent.

mod attempt;
mod directory;
mod identity;

pub use attempt::MemoryAttemptStore;
pub use directory::MemoryDirectoryStore;
pub use identity::MemoryIdentityStore;
