//! A network that is always down.

use async_trait::async_trait;
use swcache_core::{Error, Network, Request, Response};

/// Rejects every request, as a browser does with the network disconnected.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNetwork;

#[async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        tracing::debug!("offline: rejecting {} {}", request.method, request.url);
        Err(Error::Network(format!("offline: {}", request.url)))
    }
}
