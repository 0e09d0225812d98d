/*
 *  Copyright 2026 The Authors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! SQLite connection pooling and busy-retry wrapper.
//!
//! Each opened queue gets its own small connection pool (SQLite serializes
//! writers regardless of pool size). Write transactions are wrapped in
//! [`Database::retrying_transaction`], which retries on a busy/locked
//! condition with jittered exponential backoff until the configured
//! wall-clock budget elapses, matching spec §4.1's retry contract.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::QueueError;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Sets `PRAGMA busy_timeout` and foreign key enforcement on every new
/// pooled connection, as a first line of defense before the
/// application-level retry loop engages.
#[derive(Debug)]
struct ConnectionCustomizer {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A pool of connections to a single queue's SQLite file.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    busy_timeout: Duration,
    retry_interval: Duration,
}

impl Database {
    /// Opens (creating the file if absent) the SQLite database at `path`.
    pub fn new(
        path: &Path,
        busy_timeout: Duration,
        retry_interval: Duration,
    ) -> Result<Self, QueueError> {
        let manager = ConnectionManager::<SqliteConnection>::new(path.to_string_lossy());
        let pool = Pool::builder()
            .max_size(4)
            .connection_customizer(Box::new(ConnectionCustomizer {
                busy_timeout_ms: busy_timeout.as_millis() as u32,
            }))
            .build(manager)
            .map_err(|e| QueueError::StoreCorrupt(e.to_string()))?;

        Ok(Database {
            pool,
            busy_timeout,
            retry_interval,
        })
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    fn get(&self) -> Result<diesel::r2d2::PooledConnection<ConnectionManager<SqliteConnection>>, QueueError> {
        Ok(self.pool.get()?)
    }

    /// Returns true if `err` looks like a transient SQLITE_BUSY / locked
    /// condition (including the "database disk image is malformed" case
    /// seen on some NFS mounts in the original implementation) that is
    /// worth retrying rather than surfacing immediately.
    fn is_retryable(err: &QueueError) -> bool {
        match err {
            QueueError::Database(diesel::result::Error::DatabaseError(_, info)) => {
                let msg = info.message().to_lowercase();
                msg.contains("database is locked")
                    || msg.contains("database table is locked")
                    || msg.contains("database disk image is malformed")
                    || msg.contains("busy")
            }
            _ => false,
        }
    }

    /// Runs `f` inside an exclusive ("BEGIN IMMEDIATE") transaction,
    /// retrying with jittered exponential backoff on a busy/locked
    /// condition until `busy_timeout` elapses (spec §4.1).
    pub fn retrying_transaction<T, F>(&self, mut f: F) -> Result<T, QueueError>
    where
        F: FnMut(&mut SqliteConnection) -> Result<T, QueueError>,
    {
        let start = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let mut conn = self.get()?;
            // BEGIN IMMEDIATE acquires the write lock up front instead of
            // on first write, closing the same TOCTOU race a plain
            // deferred transaction would leave between a read and the
            // update that follows it (spec §5 mutual exclusion).
            let result = conn.build_transaction().immediate().run(|conn| f(conn));

            match result {
                Ok(value) => return Ok(value),
                Err(err) if Self::is_retryable(&err) => {
                    if start.elapsed() >= self.busy_timeout {
                        warn!("store busy: giving up after {:?}", start.elapsed());
                        return Err(QueueError::StoreBusy(self.busy_timeout));
                    }
                    attempt += 1;
                    let jitter: f64 = rand::thread_rng().gen_range(0.8..1.2);
                    let delay = self.retry_interval.mul_f64(jitter);
                    debug!(attempt, ?delay, "store busy, retrying");
                    thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs `f` inside a plain (non-busy-retrying) transaction; used for
    /// single-statement reads where a lock conflict is not expected.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, QueueError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, QueueError>,
    {
        let mut conn = self.get()?;
        conn.transaction(f)
    }
}
