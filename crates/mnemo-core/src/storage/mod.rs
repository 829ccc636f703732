//! Storage Module
//!
//! SQLite-backed persistence for the learning engine:
//! - Goals and questions (content, choices as JSON)
//! - Append-only attempt log
//! - Review-state aggregates and daily usage counters
//!
//! An in-memory store with the same port surface backs the tests.

mod memory;
mod migrations;
mod sqlite;

pub use memory::MemoryStore;
pub use migrations::{apply_migrations, Migration, MIGRATIONS};
pub use sqlite::SqliteStore;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Lock poisoned
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StoreError>;
