//! Activate event: drop every generation but the current one.

use futures_util::future::try_join_all;
use serde::Serialize;
use swcache_core::Error;

use super::CacheController;

/// Result of a successful activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutcome {
    pub generation: String,
    /// Generations removed from the store.
    pub deleted: Vec<String>,
    /// Take control of already open clients right away.
    pub claim_clients: bool,
}

impl CacheController {
    /// Delete all stale generations.
    ///
    /// After this returns the store holds at most the current generation.
    pub async fn on_activate(&self) -> Result<ActivateOutcome, Error> {
        let generation = self.generation();
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != generation)
            .collect();

        let removed = try_join_all(stale.iter().map(|name| self.storage.delete(name))).await?;
        let deleted: Vec<String> = stale
            .into_iter()
            .zip(removed)
            .filter_map(|(name, removed)| removed.then_some(name))
            .collect();

        for name in &deleted {
            tracing::info!("deleted stale cache generation {}", name);
        }

        Ok(ActivateOutcome {
            generation: generation.to_string(),
            deleted,
            claim_clients: self.config.clients_claim,
        })
    }
}
