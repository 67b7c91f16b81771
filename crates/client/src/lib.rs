//! Network clients for swcache.
//!
//! This crate provides the reqwest-backed `Network` used by the host binary,
//! an always-offline `Network`, and URL helpers for resolving paths against
//! the application origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, OfflineNetwork, UrlError, is_same_origin, resolve};
