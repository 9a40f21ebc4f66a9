//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup plus account/session and profile storage

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Account, ProfileRecord, SaveOutcome, Session};
pub use schema::SQLITE_INIT;
pub use sqlite::{AccountsStorage, ProfilesStorage, SqlitePool, connect};
