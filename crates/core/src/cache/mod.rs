//! Cache storage for response generations.
//!
//! Responses are grouped into named generations (one per worker version) and
//! keyed by request identity. Two backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, schema migrations,
//!   generation deletes cascade to their entries, bulk puts run in one transaction
//! - [`MemoryStorage`]: process-local, for tests
//!
//! `CacheDb` also persists the host's worker registration records.

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod registration;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use memory::MemoryStorage;
pub use registration::{Registration, WorkerState};
pub use store::CacheStorage;
