//! The network seam.
//!
//! The controller never talks to an HTTP client directly; it is handed
//! something implementing [`Network`]. The reqwest-backed client lives in
//! `swcache-client`, tests script their own.

use async_trait::async_trait;

use crate::{Error, Request, Response};

/// Issues a request, yielding a response or a failure.
///
/// A non-2xx status is still a response. Only transport-level problems
/// (offline, DNS, reset, timeout) are errors.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
