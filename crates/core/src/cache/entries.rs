//! Stored response CRUD operations.
//!
//! Entries are keyed by generation and request identity (see
//! [`compute_request_key`]). Only `GET` requests can be stored, matching the
//! Cache API.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::{Error, Request, Response};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};
use url::Url;

/// Summary of a stored response, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub cache_name: String,
    pub url: String,
    pub method: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body_len: usize,
    pub stored_at: String,
}

/// Owned row data, so it can move onto the connection thread.
struct EntryRow {
    key_hash: String,
    url: String,
    method: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn build(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("cannot cache {} requests", request.method)));
        }
        Ok(Self {
            key_hash: compute_request_key(&request.method, &request.url),
            url: request.cache_url().to_string(),
            method: request.method.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

fn upsert(conn: &rusqlite::Connection, cache_name: &str, row: &EntryRow, stored_at: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (
            cache_name, key_hash, url, method, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(cache_name, key_hash) DO UPDATE SET
            url = excluded.url,
            method = excluded.method,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            cache_name,
            &row.key_hash,
            &row.url,
            &row.method,
            row.status,
            &row.status_text,
            &row.headers_json,
            &row.body,
            stored_at,
        ],
    )?;
    Ok(())
}

fn ensure_generation(conn: &rusqlite::Connection, cache_name: &str, now: &str) -> Result<(), Error> {
    conn.execute("INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)", params![cache_name, now])?;
    Ok(())
}

impl CacheDb {
    /// Store a response under the request's identity, creating the generation if needed.
    ///
    /// Replaces any previous entry for the same request.
    pub async fn put_entry(&self, cache_name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let row = EntryRow::build(request, response)?;
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                ensure_generation(conn, &cache_name, &now)?;
                upsert(conn, &cache_name, &row, &now)
            })
            .await
            .map_err(Error::from)
    }

    /// Store several responses in one transaction: either all land or none do.
    pub async fn put_entries(&self, cache_name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::build(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                ensure_generation(&tx, &cache_name, &now)?;
                for row in &rows {
                    upsert(&tx, &cache_name, row, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for a request.
    ///
    /// Returns None for non-GET requests, unknown generations, and misses.
    pub async fn get_entry(&self, cache_name: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let cache_name = cache_name.to_string();
        let key_hash = compute_request_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, status_text, headers_json, body
                    FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![cache_name, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                });

                match result {
                    Ok((url, status, status_text, headers_json, body)) => Ok(Some(Response {
                        url: Url::parse(&url).ok(),
                        status,
                        status_text,
                        headers: serde_json::from_str(&headers_json)?,
                        body: body.into(),
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for a request. Returns false if nothing was stored.
    pub async fn delete_entry(&self, cache_name: &str, request: &Request) -> Result<bool, Error> {
        let cache_name = cache_name.to_string();
        let key_hash = compute_request_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![cache_name, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List the entries of one generation, oldest first.
    pub async fn list_entries(&self, cache_name: &str) -> Result<Vec<CachedEntry>, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, method, status, headers_json, length(body), stored_at
                    FROM entries WHERE cache_name = ?1 ORDER BY stored_at ASC, url ASC",
                )?;
                let rows = stmt
                    .query_map(params![cache_name], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, u16>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(url, method, status, headers_json, body_len, stored_at)| -> Result<CachedEntry, Error> {
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
                        let content_type = headers
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                            .map(|(_, v)| v.clone());
                        Ok(CachedEntry {
                            cache_name: cache_name.clone(),
                            url,
                            method,
                            status,
                            content_type,
                            body_len: body_len as usize,
                            stored_at,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}
