//! In-memory cache storage.
//!
//! Same semantics as the SQLite store, held in process memory behind a tokio
//! `RwLock`. Lets tests build independent controllers without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::entries::CachedEntry;
use super::hash::compute_request_key;
use super::store::CacheStorage;
use crate::{Error, Request, Response};

#[derive(Debug, Clone)]
struct StoredEntry {
    url: String,
    method: String,
    response: Response,
    stored_at: String,
}

#[derive(Debug, Default)]
struct Generation {
    name: String,
    entries: HashMap<String, StoredEntry>,
    order: Vec<String>,
}

impl Generation {
    fn insert(&mut self, key: String, entry: StoredEntry) {
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push(key);
        }
    }
}

/// Cache storage kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<RwLock<Vec<Generation>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stored(request: &Request, response: &Response) -> Result<(String, StoredEntry), Error> {
    if !request.is_get() {
        return Err(Error::InvalidInput(format!("cannot cache {} requests", request.method)));
    }
    let entry = StoredEntry {
        url: request.cache_url().to_string(),
        method: request.method.clone(),
        response: response.clone(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    };
    Ok((compute_request_key(&request.method, &request.url), entry))
}

fn generation_mut<'a>(generations: &'a mut Vec<Generation>, name: &str) -> &'a mut Generation {
    let idx = match generations.iter().position(|g| g.name == name) {
        Some(idx) => idx,
        None => {
            generations.push(Generation { name: name.to_string(), ..Default::default() });
            generations.len() - 1
        }
    };
    &mut generations[idx]
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        generation_mut(&mut generations, name);
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.generations.read().await.iter().any(|g| g.name == name))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.generations.read().await.iter().map(|g| g.name.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|g| g.name != name);
        Ok(generations.len() != before)
    }

    async fn get(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = compute_request_key(&request.method, &request.url);
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == name)
            .and_then(|g| g.entries.get(&key))
            .map(|e| e.response.clone()))
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let (key, entry) = stored(request, response)?;
        let mut generations = self.generations.write().await;
        generation_mut(&mut generations, name).insert(key, entry);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let batch = entries
            .iter()
            .map(|(request, response)| stored(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let mut generations = self.generations.write().await;
        let generation = generation_mut(&mut generations, name);
        for (key, entry) in batch {
            generation.insert(key, entry);
        }
        Ok(())
    }

    async fn delete_entry(&self, name: &str, request: &Request) -> Result<bool, Error> {
        let key = compute_request_key(&request.method, &request.url);
        let mut generations = self.generations.write().await;
        let Some(generation) = generations.iter_mut().find(|g| g.name == name) else {
            return Ok(false);
        };
        generation.order.retain(|k| k != &key);
        Ok(generation.entries.remove(&key).is_some())
    }

    async fn entries(&self, name: &str) -> Result<Vec<CachedEntry>, Error> {
        let generations = self.generations.read().await;
        let Some(generation) = generations.iter().find(|g| g.name == name) else {
            return Ok(Vec::new());
        };
        Ok(generation
            .order
            .iter()
            .filter_map(|key| generation.entries.get(key))
            .map(|e| CachedEntry {
                cache_name: name.to_string(),
                url: e.url.clone(),
                method: e.method.clone(),
                status: e.response.status,
                content_type: e.response.content_type().map(str::to_string),
                body_len: e.response.body.len(),
                stored_at: e.stored_at.clone(),
            })
            .collect())
    }
}
