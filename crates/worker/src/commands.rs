//! Subcommand implementations.
//!
//! Each command returns a serializable value; `main` prints it as JSON.

use serde::Serialize;
use swcache_client::resolve;
use swcache_core::{CacheDb, CacheStorage, CachedEntry, Error, Registration, Request, RequestMode};

use crate::cli::{EntriesArgs, EvictArgs, FetchArgs};
use crate::controller::{CacheController, ResponseSource, ResponseSummary};
use crate::host::WorkerHost;

/// Output of the fetch command.
#[derive(Debug, Serialize)]
pub struct FetchOutput {
    pub url: String,
    pub method: String,
    pub mode: RequestMode,
    pub source: ResponseSource,
    pub response: ResponseSummary,
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// One row of the caches command.
#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    pub name: String,
    pub entries: usize,
    /// Whether this is the configured generation.
    pub current: bool,
}

/// Output of the evict command.
#[derive(Debug, Serialize)]
pub struct EvictOutput {
    pub cache: String,
    pub url: String,
    /// False if nothing was stored for the request.
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub generation: String,
    pub origin: String,
    pub registrations: Vec<Registration>,
}

/// Build the request described by the fetch arguments.
pub fn build_request(controller: &CacheController, args: &FetchArgs) -> Result<Request, Error> {
    let url = resolve(controller.origin(), &args.target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mode = if args.navigate { RequestMode::Navigate } else { RequestMode::default() };
    let mut request = Request::with_method(url, &args.method, mode)?;

    for header in &args.headers {
        let Some((name, value)) = header.split_once(':') else {
            return Err(Error::InvalidInput(format!("header must be \"Name: value\", got {header:?}")));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(format!("empty header name in {header:?}")));
        }
        request = request.header(name, value.trim());
    }
    Ok(request)
}

pub async fn fetch(host: &WorkerHost, controller: &CacheController, args: &FetchArgs) -> Result<FetchOutput, Error> {
    let request = build_request(controller, args)?;
    let served = host.fetch(controller, &request).await?;

    Ok(FetchOutput {
        url: request.url.to_string(),
        method: request.method.clone(),
        mode: request.mode,
        source: served.source,
        response: ResponseSummary::from(&served.response),
        headers: served.response.headers.clone(),
        body: args
            .body
            .then(|| String::from_utf8_lossy(&served.response.body).into_owned()),
    })
}

pub async fn caches(db: &CacheDb, controller: &CacheController) -> Result<Vec<GenerationSummary>, Error> {
    let mut summaries = Vec::new();
    for name in db.keys().await? {
        let entries = db.entries(&name).await?.len();
        let current = name == controller.generation();
        summaries.push(GenerationSummary { name, entries, current });
    }
    Ok(summaries)
}

pub async fn entries(db: &CacheDb, controller: &CacheController, args: &EntriesArgs) -> Result<Vec<CachedEntry>, Error> {
    let name = args.cache.as_deref().unwrap_or(controller.generation());
    if !db.has(name).await? {
        return Err(Error::CacheMiss(format!("no cache generation named {name}")));
    }
    db.entries(name).await
}

pub async fn evict(db: &CacheDb, controller: &CacheController, args: &EvictArgs) -> Result<EvictOutput, Error> {
    let url = resolve(controller.origin(), &args.target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let name = args.cache.as_deref().unwrap_or(controller.generation());
    if !db.has(name).await? {
        return Err(Error::CacheMiss(format!("no cache generation named {name}")));
    }

    let request = Request::get(url);
    let removed = CacheStorage::delete_entry(db, name, &request).await?;
    if removed {
        tracing::info!("evicted {} from {}", request.url, name);
    }
    Ok(EvictOutput { cache: name.to_string(), url: request.url.to_string(), removed })
}

pub async fn status(host: &WorkerHost, controller: &CacheController) -> Result<StatusOutput, Error> {
    Ok(StatusOutput {
        generation: controller.generation().to_string(),
        origin: controller.origin().to_string(),
        registrations: host.status().await?,
    })
}
