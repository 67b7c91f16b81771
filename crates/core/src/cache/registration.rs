//! Worker registration records.
//!
//! The host runtime keeps one record per cache generation describing where
//! that generation is in its lifecycle. At most one record is `activated`.

use std::fmt;
use std::str::FromStr;

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// Lifecycle state of a worker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Install handler is running.
    Installing,
    /// Installed and waiting to activate.
    Installed,
    /// Active and allowed to intercept fetches.
    Activated,
    /// Failed to install or replaced by a newer generation.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installing" => Ok(WorkerState::Installing),
            "installed" => Ok(WorkerState::Installed),
            "activated" => Ok(WorkerState::Activated),
            "redundant" => Ok(WorkerState::Redundant),
            other => Err(Error::Serialization(format!("unknown worker state: {other}"))),
        }
    }
}

/// A generation's registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub generation: String,
    pub state: WorkerState,
    /// Whether this generation has claimed the already open clients.
    pub controls_clients: bool,
    pub updated_at: String,
}

fn read_registration(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, bool, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_registration(
    (generation, state, controls_clients, updated_at): (String, String, bool, String),
) -> Result<Registration, Error> {
    Ok(Registration { generation, state: state.parse()?, controls_clients, updated_at })
}

impl CacheDb {
    /// Record a generation's state, creating the record if needed.
    pub async fn set_registration(
        &self, generation: &str, state: WorkerState, controls_clients: bool,
    ) -> Result<(), Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registrations (generation, state, controls_clients, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(generation) DO UPDATE SET
                        state = excluded.state,
                        controls_clients = excluded.controls_clients,
                        updated_at = excluded.updated_at",
                    params![generation, state.as_str(), controls_clients, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn get_registration(&self, generation: &str) -> Result<Option<Registration>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Registration>, Error> {
                let result = conn.query_row(
                    "SELECT generation, state, controls_clients, updated_at
                    FROM registrations WHERE generation = ?1",
                    params![generation],
                    read_registration,
                );
                match result {
                    Ok(row) => Ok(Some(into_registration(row)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// The generation currently allowed to intercept fetches, if any.
    pub async fn active_registration(&self) -> Result<Option<Registration>, Error> {
        Ok(self
            .registrations()
            .await?
            .into_iter()
            .find(|r| r.state == WorkerState::Activated))
    }

    /// All registration records, most recently updated first.
    pub async fn registrations(&self) -> Result<Vec<Registration>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Registration>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT generation, state, controls_clients, updated_at
                    FROM registrations ORDER BY updated_at DESC, rowid DESC",
                )?;
                let rows = stmt.query_map([], read_registration)?.collect::<Result<Vec<_>, _>>()?;
                rows.into_iter().map(into_registration).collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Mark every generation other than `generation` as redundant.
    ///
    /// Returns the number of records changed.
    pub async fn retire_other_registrations(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "UPDATE registrations
                    SET state = 'redundant', controls_clients = 0, updated_at = ?2
                    WHERE generation != ?1 AND state != 'redundant'",
                    params![generation, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
