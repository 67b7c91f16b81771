//! Cache controller for the widgets application.
//!
//! Reacts to the three lifecycle events a host delivers:
//!
//! - install: precache the static assets into the current generation
//! - activate: delete every generation except the current one
//! - fetch: network-first for same-origin GETs, writing successful responses
//!   for cacheable paths through to the cache and falling back to it offline
//!
//! The controller holds no state between events beyond its configuration;
//! everything durable lives behind [`CacheStorage`].

pub mod activate;
pub mod fetch;
pub mod install;
pub mod navigation;

use std::sync::Arc;

use serde::Serialize;
use swcache_client::{is_same_origin, resolve};
use swcache_core::{AppConfig, CacheStorage, Error, Network, Request, Response};
use url::Url;

pub use activate::ActivateOutcome;
pub use fetch::{FetchDisposition, ResponseSource, Served};
pub use install::InstallOutcome;

/// Body of the synthesized response when neither network nor cache can answer.
pub const OFFLINE_BODY: &str = "Offline";

/// Event handlers bound to one cache generation.
///
/// Cheap to clone; clones share storage and network.
#[derive(Clone)]
pub struct CacheController {
    config: Arc<AppConfig>,
    origin: Url,
    static_assets: Arc<[Url]>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl CacheController {
    /// Bind a controller to `config.cache_name`.
    ///
    /// Resolves the origin and every static asset up front so a bad path is
    /// reported before any event runs.
    pub fn new(config: AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config
            .origin_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let static_assets = config
            .static_assets
            .iter()
            .map(|path| resolve(&origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { config: Arc::new(config), origin, static_assets: static_assets.into(), storage, network })
    }

    /// The generation this controller reads and writes.
    pub fn generation(&self) -> &str {
        &self.config.cache_name
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Only same-origin GETs are handled; everything else takes the default path.
    fn intercepts(&self, request: &Request) -> bool {
        request.is_get() && is_same_origin(&self.origin, &request.url)
    }

    fn is_cacheable(&self, request: &Request) -> bool {
        self.config.is_cacheable_path(request.url.path())
    }

    fn root_request(&self) -> Request {
        let mut root = self.origin.clone();
        root.set_path("/");
        root.set_query(None);
        Request::get(root)
    }

    /// Store `response` under `request` in the current generation.
    ///
    /// Failures are logged; the caller still serves the response.
    async fn write_through(&self, request: &Request, response: &Response) {
        match self.storage.put(self.generation(), request, response).await {
            Ok(()) => tracing::debug!("cached {} in {}", request.url, self.generation()),
            Err(e) => tracing::warn!("failed to cache {}: {}", request.url, e),
        }
    }

    /// Cache lookup that treats storage errors as misses.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.storage.get(self.generation(), request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("cache lookup for {} failed: {}", request.url, e);
                None
            }
        }
    }

    /// Exact match first; navigations may also fall back to the cached root document.
    async fn cache_fallback(&self, request: &Request) -> Option<Served> {
        if let Some(response) = self.lookup(request).await {
            tracing::debug!("cache hit for {}", request.url);
            return Some(Served { response, source: ResponseSource::Cache });
        }

        if request.is_navigation()
            && let Some(response) = self.lookup(&self.root_request()).await
        {
            tracing::debug!("serving cached root document for {}", request.url);
            return Some(Served { response, source: ResponseSource::Fallback });
        }

        tracing::debug!("cache miss for {}", request.url);
        None
    }

    /// The fallback chain ending in a synthesized 503.
    async fn recover(&self, request: &Request) -> Served {
        match self.cache_fallback(request).await {
            Some(served) => served,
            None => Served { response: Response::offline(OFFLINE_BODY), source: ResponseSource::Offline },
        }
    }

    /// Apply write-through to a response that arrived from the network.
    async fn complete(&self, request: &Request, response: Response) -> Served {
        if response.ok() && self.is_cacheable(request) {
            self.write_through(request, &response).await;
        }
        Served { response, source: ResponseSource::Network }
    }
}

/// JSON-friendly view of a response for CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary {
    pub url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body_len: usize,
}

impl From<&Response> for ResponseSummary {
    fn from(response: &Response) -> Self {
        Self {
            url: response.url.as_ref().map(Url::to_string),
            status: response.status,
            status_text: response.status_text.clone(),
            content_type: response.content_type().map(str::to_string),
            body_len: response.body.len(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use swcache_core::MemoryStorage;

    #[test]
    fn test_new_resolves_static_assets() {
        let controller = controller(config("widgets-app-v1"), &MemoryStorage::new(), &FakeNetwork::new());
        let assets: Vec<&str> = controller.static_assets.iter().map(Url::as_str).collect();
        assert_eq!(
            assets,
            vec![
                "http://localhost:3000/",
                "http://localhost:3000/icon-192x192.png",
                "http://localhost:3000/icon-512x512.png"
            ]
        );
        assert_eq!(controller.generation(), "widgets-app-v1");
    }

    #[test]
    fn test_new_rejects_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = CacheController::new(config, Arc::new(MemoryStorage::new()), FakeNetwork::new());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_intercepts_only_same_origin_get() {
        let controller = controller(config("widgets-app-v1"), &MemoryStorage::new(), &FakeNetwork::new());

        assert!(controller.intercepts(&Request::get(url("/widgets"))));
        assert!(controller.intercepts(&Request::navigate(url("/"))));
        assert!(!controller.intercepts(&Request::get(Url::parse("https://cdn.example.com/lib.js").unwrap())));
        let post = Request::with_method(url("/api/widgets"), "POST", Default::default()).unwrap();
        assert!(!controller.intercepts(&post));
    }

    #[test]
    fn test_cacheable_predicate() {
        let controller = controller(config("widgets-app-v1"), &MemoryStorage::new(), &FakeNetwork::new());
        let cacheable = |path: &str| controller.is_cacheable(&Request::get(url(path)));

        assert!(cacheable("/"));
        assert!(cacheable("/widgets"));
        assert!(cacheable("/widgets/42"));
        assert!(cacheable("/icon-192x192.png"));
        assert!(cacheable("/_next/static/chunks/main.js"));
        assert!(cacheable("/api/widgets"));
        assert!(cacheable("/about"));
    }

    #[test]
    fn test_cacheable_predicate_without_root_prefix() {
        let config = AppConfig { cacheable_paths: vec!["/widgets".into(), "/icon-".into()], ..config("widgets-app-v1") };
        let controller = controller(config, &MemoryStorage::new(), &FakeNetwork::new());
        let cacheable = |path: &str| controller.is_cacheable(&Request::get(url(path)));

        assert!(cacheable("/widgets/42"));
        assert!(cacheable("/icon-512x512.png"));
        assert!(!cacheable("/"));
        assert!(!cacheable("/about"));
    }

    #[test]
    fn test_response_summary() {
        let summary = ResponseSummary::from(&html("<p>hi</p>").with_url(url("/")));
        assert_eq!(summary.url.as_deref(), Some("http://localhost:3000/"));
        assert_eq!(summary.status, 200);
        assert_eq!(summary.content_type.as_deref(), Some("text/html"));
        assert_eq!(summary.body_len, 9);
    }
}
