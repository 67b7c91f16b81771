//! Host runtime: delivers lifecycle events and records registration state.
//!
//! A browser keeps a registration per worker version and moves it through
//! `installing -> installed -> activated`, or to `redundant` when it fails or
//! is replaced. The host does the same against the SQLite registry so that
//! separate CLI invocations see a consistent lifecycle.

use std::sync::Arc;

use serde::Serialize;
use swcache_core::{CacheDb, Error, Network, Registration, Request, WorkerState};

use crate::controller::{ActivateOutcome, CacheController, FetchDisposition, InstallOutcome, ResponseSource, Served};

/// Result of the install event, plus the activation it triggered when skipping the wait.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub install: InstallOutcome,
    pub activation: Option<ActivateOutcome>,
    pub state: WorkerState,
}

pub struct WorkerHost {
    registry: CacheDb,
    network: Arc<dyn Network>,
}

impl WorkerHost {
    /// `network` serves requests the controller does not intercept.
    pub fn new(registry: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { registry, network }
    }

    /// Run the install event for the controller's generation.
    ///
    /// Reinstalling the active generation refreshes its precache without
    /// touching its registration.
    pub async fn install(&self, controller: &CacheController) -> Result<InstallReport, Error> {
        let generation = controller.generation();
        let was_active = self
            .registry
            .get_registration(generation)
            .await?
            .is_some_and(|r| r.state == WorkerState::Activated);

        if !was_active {
            self.registry
                .set_registration(generation, WorkerState::Installing, false)
                .await?;
        }

        let install = match controller.on_install().await {
            Ok(outcome) => outcome,
            Err(e) => {
                if !was_active {
                    self.registry
                        .set_registration(generation, WorkerState::Redundant, false)
                        .await?;
                }
                return Err(e);
            }
        };

        if was_active {
            tracing::info!("refreshed precache for active generation {}", generation);
            return Ok(InstallReport { install, activation: None, state: WorkerState::Activated });
        }

        self.registry
            .set_registration(generation, WorkerState::Installed, false)
            .await?;
        tracing::info!("installed {}", generation);

        if !install.skip_waiting {
            tracing::info!("{} is waiting for existing clients to close", generation);
            return Ok(InstallReport { install, activation: None, state: WorkerState::Installed });
        }

        let activation = self.activate(controller).await?;
        Ok(InstallReport { install, activation: Some(activation), state: WorkerState::Activated })
    }

    /// Run the activate event for an installed generation.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` unless the generation is `installed` or already `activated`.
    pub async fn activate(&self, controller: &CacheController) -> Result<ActivateOutcome, Error> {
        let generation = controller.generation();
        match self.registry.get_registration(generation).await? {
            Some(r) if matches!(r.state, WorkerState::Installed | WorkerState::Activated) => {}
            Some(r) => {
                return Err(Error::InvalidState(format!("{} is {}; install it first", generation, r.state)));
            }
            None => return Err(Error::InvalidState(format!("{} has not been installed", generation))),
        }

        let outcome = controller.on_activate().await?;

        self.registry
            .set_registration(generation, WorkerState::Activated, outcome.claim_clients)
            .await?;
        let retired = self.registry.retire_other_registrations(generation).await?;
        tracing::info!("activated {} (retired {} registrations)", generation, retired);

        Ok(outcome)
    }

    /// Deliver a fetch event.
    ///
    /// Only the active generation intercepts; other requests take the default
    /// network path, whose errors reach the caller.
    pub async fn fetch(&self, controller: &CacheController, request: &Request) -> Result<Served, Error> {
        let active = self.registry.active_registration().await?;
        let controls = active.is_some_and(|r| r.generation == controller.generation() && r.state.can_intercept_fetch());

        if controls {
            if let FetchDisposition::Respond(served) = controller.on_fetch(request).await {
                return Ok(served);
            }
        } else {
            tracing::debug!("{} is not active; fetching {} directly", controller.generation(), request.url);
        }

        let response = self.network.fetch(request).await?;
        Ok(Served { response, source: ResponseSource::Passthrough })
    }

    /// Every registration, most recently updated first.
    pub async fn status(&self) -> Result<Vec<Registration>, Error> {
        self.registry.registrations().await
    }
}
