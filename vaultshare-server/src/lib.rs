//! HTTP surface for the vaultshare directory ledger
//!
//! Exposed as a library so integration tests can assemble the router
//! against in-memory backends.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
