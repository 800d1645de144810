//! vaultshare-store: Content-addressed blob storage
//!
//! Async backends for published file bytes, keyed by Blake3-derived
//! content address. No authorization logic — access decisions live in
//! the ledger's evaluator; this crate only guarantees that what comes
//! back is what went in.
//!
//! ## Backends
//!
//! | Backend              | Use Case          |
//! |----------------------|-------------------|
//! | `InMemoryContentStore` | Unit tests      |
//! | `LocalContentStore`    | Local deployments, integration tests |
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultshare_store::{ContentStore, InMemoryContentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryContentStore::new();
//!
//!     let address = store.put(b"Hello, blobs!").await?;
//!     let retrieved = store.get(&address).await?;
//!     assert_eq!(retrieved, b"Hello, blobs!");
//!
//!     Ok(())
//! }
//! ```

mod error;
mod traits;

mod local;
mod memory;

// Re-exports
pub use error::{ContentError, ContentResult};
pub use traits::{ContentAddress, ContentStore};

pub use local::LocalContentStore;
pub use memory::InMemoryContentStore;
