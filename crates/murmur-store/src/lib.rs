//! # murmur-store
//!
//! Storage for the Murmur user directory and message log.
//!
//! Callers program against the [`ChatStore`] trait. Two backends implement
//! it: [`MemoryStore`], an in-process map, and [`SqliteStore`], which wraps
//! a migrated `rusqlite` [`Database`]. Both assign ids and timestamps
//! themselves, using an injectable [`Clock`].

pub mod clock;
pub mod database;
pub mod memory;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod sqlite;
pub mod store;
pub mod users;

mod error;


pub use clock::{system_clock, Clock, ManualClock};
pub use database::Database;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;
pub use store::ChatStore;
