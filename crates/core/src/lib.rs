//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response types exchanged between the controller, the cache and the network
//! - The `CacheStorage` and `Network` seams
//! - Cache storage with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod network;

pub use cache::{CacheDb, CacheStorage, CachedEntry, MemoryStorage, Registration, WorkerState};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, RequestMode, Response};
pub use network::Network;
