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

//! The task manager (spec §4.4): the owning identity a batch of tasks is
//! submitted under, and the thin forward from `spawn` to a [`Provider`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::payload::encode_manager;
use crate::queue::{ManagerRecord, Queue, ReplacePolicy};
use crate::task::identity::compute_manager_id;
use crate::task::{Future, Task};
use crate::traits::Provider;

/// The canonicalized identity of a manager: an environment snapshot, the
/// scheduler's `max_workers` plus whatever opaque batch-time limits the
/// caller passed through, and an opaque provider configuration blob
/// (spec §6 "Manager identifier").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub environ: BTreeMap<String, String>,
    pub max_workers: usize,
    pub scheduler_extra: serde_json::Value,
    pub provider_config: serde_json::Value,
}

impl ManagerConfig {
    pub fn new(environ: BTreeMap<String, String>, max_workers: usize) -> Self {
        ManagerConfig {
            environ,
            max_workers,
            scheduler_extra: serde_json::Value::Null,
            provider_config: serde_json::Value::Null,
        }
    }
}

/// Owns a manager's identity, its config, and the [`Provider`] used to
/// launch workers on its behalf. One `TaskManager` is constructed per
/// submitting process; its `id` is stable across processes that submit
/// with an identical config.
pub struct TaskManager<P: Provider> {
    id: Uuid,
    config: ManagerConfig,
    provider: P,
}

impl<P: Provider> TaskManager<P> {
    pub fn new(config: ManagerConfig, provider: P) -> Self {
        let id = compute_manager_id(&config);
        TaskManager { id, config, provider }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn record(&self) -> Result<ManagerRecord, crate::error::QueueError> {
        Ok(ManagerRecord {
            id: self.id,
            payload: encode_manager(&self.config)?,
        })
    }

    /// Tags `task` with this manager's id and delegates to
    /// [`Queue::add`] (spec §4.4 `add`), returning its [`Future`].
    pub fn add<'q>(&self, queue: &'q Queue, mut task: Task, replace: ReplacePolicy) -> Result<Future<'q>, crate::error::QueueError> {
        task.manager_id = self.id;
        let futures = queue.add(vec![task], &self.record()?, replace)?;
        Ok(futures
            .into_iter()
            .next()
            .expect("add returns one future per submitted task"))
    }

    /// Asks the provider to ensure up to `min(ntasks, max_workers)` workers
    /// running `command_line` exist (spec §4.4 `spawn`, §4.6 spawner loop).
    pub fn spawn(&self, command_line: &[String], ntasks: usize) -> Result<(), AppError> {
        self.provider.launch(command_line, ntasks, self.config.max_workers)
    }
}
