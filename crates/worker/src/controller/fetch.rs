//! Fetch event: network-first with selective write-through.
//!
//! ### Behaviour
//! - Cross-origin and non-GET requests pass through untouched
//! - Navigations use the timeout variant when one is configured
//! - Ok responses for cacheable paths are stored before they are returned
//! - Network failure falls back to an exact cache match, then (navigations
//!   only) the cached root document, then a `503` with body `Offline`

use serde::Serialize;
use swcache_core::{Request, Response};

use super::CacheController;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    /// Exact match in the current generation.
    Cache,
    /// Cached root document served for a navigation.
    Fallback,
    /// Synthesized 503.
    Offline,
    /// Not intercepted; fetched the default way.
    Passthrough,
}

/// A response together with its provenance.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// What the controller decided to do with a fetch event.
#[derive(Debug, Clone)]
pub enum FetchDisposition {
    /// The controller answers with this response.
    Respond(Served),
    /// The controller declined; the host performs its default fetch.
    Passthrough,
}

impl CacheController {
    /// Handle one fetch event.
    ///
    /// Never fails: network errors end in the fallback chain, and an
    /// intercepted request always gets exactly one response.
    pub async fn on_fetch(&self, request: &Request) -> FetchDisposition {
        if !self.intercepts(request) {
            tracing::debug!("passing through {} {}", request.method, request.url);
            return FetchDisposition::Passthrough;
        }

        let served = match self.config.navigation_timeout() {
            Some(timeout) if request.is_navigation() => self.navigate(request, timeout).await,
            _ => self.network_first(request).await,
        };
        FetchDisposition::Respond(served)
    }

    async fn network_first(&self, request: &Request) -> Served {
        match self.network.fetch(request).await {
            Ok(response) => self.complete(request, response).await,
            Err(e) => {
                tracing::debug!("network failed for {}: {}", request.url, e);
                self.recover(request).await
            }
        }
    }
}
