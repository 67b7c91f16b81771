//! Install event: precache the static assets.

use futures_util::future::try_join_all;
use serde::Serialize;
use swcache_core::{Error, Request, Response};

use super::CacheController;

/// Result of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    pub generation: String,
    /// Absolute URLs now stored in the generation.
    pub cached: Vec<String>,
    /// Activate without waiting for existing clients to close.
    pub skip_waiting: bool,
}

impl CacheController {
    /// Fetch every static asset concurrently and store them as one unit.
    ///
    /// # Errors
    ///
    /// `Error::PrecacheFailed` for the first asset that fails to fetch or
    /// answers with a non-ok status; nothing is written in that case. Storage
    /// errors propagate as-is.
    pub async fn on_install(&self) -> Result<InstallOutcome, Error> {
        let generation = self.generation();
        self.storage.open(generation).await?;

        let fetches = self.static_assets.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::PrecacheFailed { url: url.to_string(), reason: e.to_string() })?;

            if !response.ok() {
                return Err(Error::PrecacheFailed {
                    url: url.to_string(),
                    reason: format!("status {} {}", response.status, response.status_text),
                });
            }
            Ok::<(Request, Response), Error>((request, response))
        });

        let entries = match try_join_all(fetches).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("install of {} failed: {}", generation, e);
                return Err(e);
            }
        };

        self.storage.put_all(generation, &entries).await?;

        let cached: Vec<String> = entries.iter().map(|(request, _)| request.url.to_string()).collect();
        tracing::info!("precached {} assets into {}", cached.len(), generation);

        Ok(InstallOutcome { generation: generation.to_string(), cached, skip_waiting: self.config.skip_waiting })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use swcache_core::{AppConfig, CacheStorage, Error, MemoryStorage, Request, Response};

    #[tokio::test]
    async fn test_install_precaches_every_asset() {
        let storage = MemoryStorage::new();
        let network = network_with_assets();
        let controller = controller(config("widgets-app-v1"), &storage, &network);

        let outcome = controller.on_install().await.unwrap();

        assert_eq!(outcome.generation, "widgets-app-v1");
        assert_eq!(outcome.cached.len(), 3);
        assert!(outcome.skip_waiting);
        for path in ["/", "/icon-192x192.png", "/icon-512x512.png"] {
            let cached = storage.get("widgets-app-v1", &Request::get(url(path))).await.unwrap();
            assert!(cached.is_some(), "{path} not precached");
        }
        let root = storage.get("widgets-app-v1", &Request::get(url("/"))).await.unwrap().unwrap();
        assert_eq!(&root.body[..], b"<h1>Widgets</h1>");
    }

    #[tokio::test]
    async fn test_install_fails_as_unit_on_missing_asset() {
        let storage = MemoryStorage::new();
        let network = network_with_assets();
        network.respond("/icon-512x512.png", Response::new(404, "Not Found", ""));
        let controller = controller(config("widgets-app-v1"), &storage, &network);

        let err = controller.on_install().await.unwrap_err();

        match err {
            Error::PrecacheFailed { url, reason } => {
                assert_eq!(url, "http://localhost:3000/icon-512x512.png");
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(storage.entries("widgets-app-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_fails_on_network_error() {
        let storage = MemoryStorage::new();
        let network = network_with_assets();
        network.fail("/icon-192x192.png");
        let controller = controller(config("widgets-app-v1"), &storage, &network);

        let err = controller.on_install().await.unwrap_err();

        assert!(err.to_string().starts_with("PRECACHE_FAILED"));
        assert!(storage.entries("widgets-app-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_leaves_other_generations_alone() {
        let storage = MemoryStorage::new();
        storage
            .put("widgets-app-v0", &Request::get(url("/widgets")), &html("old"))
            .await
            .unwrap();
        let network = network_with_assets();
        let controller = controller(config("widgets-app-v1"), &storage, &network);

        controller.on_install().await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["widgets-app-v0", "widgets-app-v1"]);
        assert_eq!(storage.entries("widgets-app-v0").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_install_reports_skip_waiting_setting() {
        let storage = MemoryStorage::new();
        let network = network_with_assets();
        let config = AppConfig { skip_waiting: false, ..config("widgets-app-v1") };
        let controller = controller(config, &storage, &network);

        let outcome = controller.on_install().await.unwrap();
        assert!(!outcome.skip_waiting);
    }

    #[tokio::test]
    async fn test_install_fetches_each_asset_once() {
        let storage = MemoryStorage::new();
        let network = network_with_assets();
        let controller = controller(config("widgets-app-v1"), &storage, &network);

        controller.on_install().await.unwrap();

        let mut calls = network.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                "http://localhost:3000/",
                "http://localhost:3000/icon-192x192.png",
                "http://localhost:3000/icon-512x512.png"
            ]
        );
    }
}
