//! Navigation variant: network-first with a deadline.
//!
//! The network fetch runs on its own task. If it has not settled when the
//! deadline passes, the cache chain answers instead and the fetch keeps going
//! in the background so a late success still refreshes the cache. With
//! nothing cached the navigation keeps waiting for the network.

use std::sync::Arc;
use std::time::Duration;

use swcache_core::{Error, Request, Response};
use tokio::task::JoinError;

use super::{CacheController, Served};

impl CacheController {
    pub(super) async fn navigate(&self, request: &Request, timeout: Duration) -> Served {
        let network = Arc::clone(&self.network);
        let outbound = request.clone();
        let mut pending = tokio::spawn(async move { network.fetch(&outbound).await });

        match tokio::time::timeout(timeout, &mut pending).await {
            Ok(settled) => return self.settle(request, settled).await,
            Err(_) => tracing::debug!("navigation to {} exceeded {:?}; consulting cache", request.url, timeout),
        }

        if let Some(served) = self.cache_fallback(request).await {
            let controller = self.clone();
            let request = request.clone();
            tokio::spawn(async move {
                if let Ok(Ok(response)) = pending.await
                    && response.ok()
                    && controller.is_cacheable(&request)
                {
                    controller.write_through(&request, &response).await;
                }
            });
            return served;
        }

        tracing::debug!("nothing cached for {}; waiting for network", request.url);
        let settled = pending.await;
        self.settle(request, settled).await
    }

    async fn settle(&self, request: &Request, settled: Result<Result<Response, Error>, JoinError>) -> Served {
        match settled {
            Ok(Ok(response)) => self.complete(request, response).await,
            Ok(Err(e)) => {
                tracing::debug!("network failed for {}: {}", request.url, e);
                self.recover(request).await
            }
            Err(e) => {
                tracing::warn!("network task for {} did not finish: {}", request.url, e);
                self.recover(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::testing::*;
    use super::super::{FetchDisposition, ResponseSource, Served};
    use swcache_core::{AppConfig, CacheStorage, MemoryStorage, Request, Response};

    const DEADLINE: Duration = Duration::from_secs(10);

    fn navigation_config() -> AppConfig {
        AppConfig { navigation_timeout_ms: Some(10_000), ..config("widgets-app-v1") }
    }

    async fn navigate(controller: &super::CacheController, path: &str) -> Served {
        match controller.on_fetch(&Request::navigate(url(path))).await {
            FetchDisposition::Respond(served) => served,
            FetchDisposition::Passthrough => panic!("navigation was not intercepted"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_network_wins_and_is_cached() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.respond_after("/widgets", Duration::from_secs(2), html("fresh"));
        let controller = controller(navigation_config(), &storage, &network);

        let served = navigate(&controller, "/widgets").await;

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(&served.response.body[..], b"fresh");
        assert!(storage.get("widgets-app-v1", &Request::get(url("/widgets"))).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_network_serves_cache_then_refreshes() {
        let storage = MemoryStorage::new();
        storage.put("widgets-app-v1", &Request::get(url("/widgets")), &html("stale")).await.unwrap();
        let network = FakeNetwork::new();
        network.respond_after("/widgets", DEADLINE * 3, html("fresh"));
        let controller = controller(navigation_config(), &storage, &network);

        let start = tokio::time::Instant::now();
        let served = navigate(&controller, "/widgets").await;

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(&served.response.body[..], b"stale");
        assert!(start.elapsed() < DEADLINE * 2);

        tokio::time::sleep(DEADLINE * 3).await;
        let cached = storage.get("widgets-app-v1", &Request::get(url("/widgets"))).await.unwrap().unwrap();
        assert_eq!(&cached.body[..], b"fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_network_serves_root_when_page_uncached() {
        let storage = MemoryStorage::new();
        storage.put("widgets-app-v1", &Request::get(url("/")), &html("shell")).await.unwrap();
        let network = FakeNetwork::new();
        network.respond_after("/widgets/9", DEADLINE * 3, html("widget nine"));
        let controller = controller(navigation_config(), &storage, &network);

        let served = navigate(&controller, "/widgets/9").await;

        assert_eq!(served.source, ResponseSource::Fallback);
        assert_eq!(&served.response.body[..], b"shell");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_network_with_empty_cache_keeps_waiting() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.respond_after("/widgets", DEADLINE * 3, html("eventually"));
        let controller = controller(navigation_config(), &storage, &network);

        let start = tokio::time::Instant::now();
        let served = navigate(&controller, "/widgets").await;

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(&served.response.body[..], b"eventually");
        assert!(start.elapsed() >= DEADLINE * 3);
        assert!(storage.get("widgets-app-v1", &Request::get(url("/widgets"))).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_failure_with_empty_cache_is_offline() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.fail_after("/widgets", DEADLINE * 2);
        let controller = controller(navigation_config(), &storage, &network);

        let served = navigate(&controller, "/widgets").await;

        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(served.response.status, 503);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_failure_uses_fallback_chain() {
        let storage = MemoryStorage::new();
        storage.put("widgets-app-v1", &Request::get(url("/")), &html("shell")).await.unwrap();
        let network = FakeNetwork::new();
        network.fail("/widgets");
        let controller = controller(navigation_config(), &storage, &network);

        let start = tokio::time::Instant::now();
        let served = navigate(&controller, "/widgets").await;

        assert_eq!(served.source, ResponseSource::Fallback);
        assert!(start.elapsed() < DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_error_response_does_not_overwrite_cache() {
        let storage = MemoryStorage::new();
        storage.put("widgets-app-v1", &Request::get(url("/widgets")), &html("good")).await.unwrap();
        let network = FakeNetwork::new();
        network.respond_after("/widgets", DEADLINE * 2, Response::new(500, "Internal Server Error", "boom"));
        let controller = controller(navigation_config(), &storage, &network);

        let served = navigate(&controller, "/widgets").await;
        assert_eq!(served.source, ResponseSource::Cache);

        tokio::time::sleep(DEADLINE * 3).await;
        let cached = storage.get("widgets-app-v1", &Request::get(url("/widgets"))).await.unwrap().unwrap();
        assert_eq!(&cached.body[..], b"good");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subresources_ignore_navigation_deadline() {
        let storage = MemoryStorage::new();
        storage.put("widgets-app-v1", &Request::get(url("/widgets")), &html("stale")).await.unwrap();
        let network = FakeNetwork::new();
        network.respond_after("/widgets", DEADLINE * 3, html("fresh"));
        let controller = controller(navigation_config(), &storage, &network);

        let disposition = controller.on_fetch(&Request::get(url("/widgets"))).await;

        let FetchDisposition::Respond(served) = disposition else { panic!("not intercepted") };
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(&served.response.body[..], b"fresh");
    }
}
