//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `sqlite`: SQLite persistence for entities and leads
//! - `http`: axum routes for the chat surface
//! - `sanitize`: PII filtering for logs

pub mod http;
pub mod sanitize;
pub mod sqlite;

// Re-export store error for lib.rs
pub use sqlite::StoreError;
