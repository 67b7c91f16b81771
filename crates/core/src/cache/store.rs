//! The cache storage seam.
//!
//! [`CacheStorage`] is the host-provided key/value store the controller works
//! against: named generations holding request → response entries. `CacheDb`
//! is the durable implementation; `MemoryStorage` backs tests.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::CachedEntry;
use crate::{Error, Request, Response};

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named generation if it does not exist.
    async fn open(&self, name: &str) -> Result<(), Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// All generation names, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation with all its entries. Returns false if it was absent.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Exact-match lookup of a request in one generation.
    async fn get(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Store one response, replacing any previous entry for the request.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store a group of responses atomically.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    async fn delete_entry(&self, name: &str, request: &Request) -> Result<bool, Error>;

    async fn entries(&self, name: &str) -> Result<Vec<CachedEntry>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.open_generation(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.has_generation(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_generation(name).await
    }

    async fn get(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.get_entry(name, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.put_entries(name, entries).await
    }

    async fn delete_entry(&self, name: &str, request: &Request) -> Result<bool, Error> {
        CacheDb::delete_entry(self, name, request).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<CachedEntry>, Error> {
        self.list_entries(name).await
    }
}
