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

//! On-disk lifecycle of a single queue's store: directory layout, file
//! permissions, schema bootstrap/migration, and deletion (spec §4.1/§6).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::connection::Database;
use crate::config::Config;
use crate::error::QueueError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Validates a bare queue or user name against spec §6's naming rule.
pub fn validate_name(name: &str) -> Result<(), QueueError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(QueueError::NameInvalid(name.to_string()))
    }
}

/// The embedded, crash-safe store backing one queue.
pub struct Store {
    pub database: Database,
    pub dir: PathBuf,
}

impl Store {
    fn db_path(dir: &Path) -> PathBuf {
        dir.join("queue.sqlite")
    }

    /// Opens (or creates) the store for `queue_dir` = `<base_dir>/<user>/<queue>`.
    pub fn open(queue_dir: &Path, create: bool, config: &Config) -> Result<Self, QueueError> {
        let db_path = Self::db_path(queue_dir);
        let exists = db_path.exists();

        if create && exists {
            return Err(QueueError::AlreadyExists(queue_dir.display().to_string()));
        }
        if !create && !exists {
            return Err(QueueError::NotFound(queue_dir.display().to_string()));
        }

        if create {
            fs::create_dir_all(queue_dir)?;
            fs::set_permissions(queue_dir, fs::Permissions::from_mode(0o700))?;
        }

        let database = Database::new(&db_path, config.store_busy_timeout, config.store_retry_interval)?;

        if create {
            let mut conn = database.pool().get()?;
            conn.run_pending_migrations(MIGRATIONS)
                .map_err(|e| QueueError::StoreCorrupt(e.to_string()))?;
            drop(conn);
            fs::set_permissions(&db_path, fs::Permissions::from_mode(0o600))?;
            info!(queue_dir = %queue_dir.display(), "created new queue store");
        } else {
            let mut conn = database.pool().get()?;
            conn.run_pending_migrations(MIGRATIONS)
                .map_err(|e| QueueError::StoreCorrupt(e.to_string()))?;
        }

        Ok(Store {
            database,
            dir: queue_dir.to_path_buf(),
        })
    }

    /// Closes the store and recursively removes the queue's directory
    /// (spec §4.3 `delete`).
    pub fn delete(self) -> Result<(), QueueError> {
        let dir = self.dir.clone();
        drop(self);
        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_name_accepts_alphanumeric_underscore_hyphen() {
        assert!(validate_name("my-queue_1").is_ok());
        assert!(validate_name("bad name").is_err());
        assert!(validate_name("bad/name").is_err());
    }

    #[test]
    fn open_create_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let queue_dir = dir.path().join("q");
        let config = Config::default();

        let store = Store::open(&queue_dir, true, &config).unwrap();
        drop(store);

        assert!(Store::open(&queue_dir, true, &config).is_err());
        let reopened = Store::open(&queue_dir, false, &config).unwrap();
        reopened.delete().unwrap();

        assert!(Store::open(&queue_dir, false, &config).is_err());
    }
}
