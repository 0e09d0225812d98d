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

//! The task queue (spec §4.3), the largest single piece of the core: task
//! persistence, the pop/claim primitive, state transitions, the
//! WAITING -> PENDING cascade, and queue-level pause/resume/delete.

pub mod cascade;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use diesel::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::database::schema::{managers, metadata, requires, tasks};
use crate::database::store::validate_name;
use crate::database::Store;
use crate::error::QueueError;
use crate::models::payload::{decode_manager, decode_task, encode_task};
use crate::models::row::{ManagerRow, MetadataRow, NewTaskRow, RequireRow, TaskRow};
use crate::task::{Future, Task, TaskState};

/// Parses a [`TaskRow`] back into a [`Task`].
fn row_to_task(row: TaskRow) -> Result<Task, QueueError> {
    let id = Uuid::parse_str(&row.id).map_err(|e| QueueError::StoreCorrupt(e.to_string()))?;
    let state = TaskState::from_str(&row.state).map_err(QueueError::StoreCorrupt)?;
    let manager_id = Uuid::parse_str(&row.manager_id).map_err(|e| QueueError::StoreCorrupt(e.to_string()))?;
    decode_task(id, state, manager_id, &row.payload)
}

/// Current wall-clock time in epoch milliseconds, used for the
/// `heartbeat_at` staleness check `reap` relies on.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether a submitted queue accepts writers or only reads (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Active,
    Paused,
}

impl QueueState {
    fn as_str(self) -> &'static str {
        match self {
            QueueState::Active => "ACTIVE",
            QueueState::Paused => "PAUSED",
        }
    }

    fn parse(s: &str) -> Result<Self, QueueError> {
        match s {
            "ACTIVE" => Ok(QueueState::Active),
            "PAUSED" => Ok(QueueState::Paused),
            other => Err(QueueError::StoreCorrupt(format!("unknown queue_state {other}"))),
        }
    }
}

/// The three re-add semantics named explicitly in spec §4.3, replacing the
/// original's overloaded `replace=None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacePolicy {
    RejectExisting,
    Replace,
    Upsert,
}

/// Filters `tasks`/`counts`/`summary` by owning manager.
#[derive(Debug, Clone, Copy, Default)]
pub enum ManagerFilter {
    #[default]
    Any,
    Only(Uuid),
}

/// Filters `tasks`/`counts` by task state.
#[derive(Debug, Clone, Copy, Default)]
pub enum StateFilter {
    #[default]
    Any,
    Only(TaskState),
}

/// The minimal manager identity `Queue::add` needs to persist the owning
/// manager row; `TaskManager` (§4.4) constructs this from its full config.
#[derive(Debug, Clone)]
pub struct ManagerRecord {
    pub id: Uuid,
    pub payload: Vec<u8>,
}

/// One embedded queue store plus its bookkeeping.
pub struct Queue {
    store: Store,
    name: String,
    future_poll_interval: Duration,
}

impl Queue {
    /// Opens the queue directory `<base_dir>/<user>/<name>`, creating it
    /// when `create` is set (spec §6 `queues` layout).
    pub fn open(base_dir: &Path, user: &str, name: &str, create: bool, config: &Config) -> Result<Self, QueueError> {
        validate_name(user)?;
        validate_name(name)?;
        let dir = base_dir.join(user).join(name);
        let store = Store::open(&dir, create, config)?;
        Ok(Queue {
            store,
            name: name.to_string(),
            future_poll_interval: config.future_poll_interval,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &PathBuf {
        &self.store.dir
    }

    /// Persists `tasks` and their `requires` edges under `manager`,
    /// applying `replace` to any ids that already exist (spec §4.3 `add`).
    /// Returns one [`Future`] per submitted task, in submission order
    /// (after id-collision handling).
    pub fn add(&self, incoming: Vec<Task>, manager: &ManagerRecord, replace: ReplacePolicy) -> Result<Vec<Future<'_>>, QueueError> {
        if incoming.is_empty() {
            return Ok(Vec::new());
        }

        let edges: Vec<(Uuid, Uuid)> = incoming
            .iter()
            .flat_map(|t| t.requires().into_iter().map(move |r| (t.id, r)))
            .collect();
        cascade::reject_cycles(&edges)?;

        let ids: Vec<Uuid> = incoming.iter().map(|t| t.id).collect();

        self.store.database.retrying_transaction(|conn| {
            let manager_row = ManagerRow {
                manager_id: manager.id.to_string(),
                payload: manager.payload.clone(),
            };
            diesel::insert_into(managers::table)
                .values(&manager_row)
                .on_conflict(managers::manager_id)
                .do_update()
                .set(managers::payload.eq(&manager_row.payload))
                .execute(conn)?;

            for task in &incoming {
                let id_str = task.id.to_string();
                let existing: Option<String> = tasks::table
                    .filter(tasks::id.eq(&id_str))
                    .select(tasks::id)
                    .first(conn)
                    .optional()?;

                let skip_requires = matches!((&existing, replace), (Some(_), ReplacePolicy::Upsert));
                // Upsert preserves the caller's given state (write-back of a
                // running/terminal outcome); a fresh insert or a full
                // replace instead derives WAITING/PENDING from `requires`
                // the way the original submission path does.
                let effective_state = if matches!((&existing, replace), (Some(_), ReplacePolicy::Upsert)) {
                    task.state
                } else {
                    task.initial_state()
                };

                match (existing, replace) {
                    (Some(_), ReplacePolicy::RejectExisting) => {
                        return Err(QueueError::DuplicateId(task.id));
                    }
                    (Some(_), ReplacePolicy::Replace) => {
                        diesel::delete(requires::table.filter(requires::id.eq(&id_str))).execute(conn)?;
                        let payload = encode_task(task)?;
                        diesel::update(tasks::table.filter(tasks::id.eq(&id_str)))
                            .set((
                                tasks::payload.eq(&payload),
                                tasks::state.eq(effective_state.to_string()),
                                tasks::manager_id.eq(manager.id.to_string()),
                            ))
                            .execute(conn)?;
                    }
                    (Some(_), ReplacePolicy::Upsert) => {
                        let payload = encode_task(task)?;
                        diesel::update(tasks::table.filter(tasks::id.eq(&id_str)))
                            .set((
                                tasks::payload.eq(&payload),
                                tasks::state.eq(effective_state.to_string()),
                                tasks::manager_id.eq(manager.id.to_string()),
                            ))
                            .execute(conn)?;
                        // requires edges are left untouched (spec §4.3 invariant 5).
                    }
                    (None, _) => {
                        let payload = encode_task(task)?;
                        let row = NewTaskRow {
                            id: id_str.clone(),
                            payload,
                            state: effective_state.to_string(),
                            manager_id: manager.id.to_string(),
                        };
                        diesel::insert_into(tasks::table).values(&row).execute(conn)?;
                    }
                }

                if !skip_requires {
                    for require in task.requires() {
                        let row = RequireRow {
                            id: id_str.clone(),
                            require: require.to_string(),
                        };
                        diesel::insert_into(requires::table)
                            .values(&row)
                            .on_conflict_do_nothing()
                            .execute(conn)?;
                    }
                }
            }

            Ok(())
        })?;

        info!(queue = %self.name, count = ids.len(), "added tasks");
        Ok(ids
            .into_iter()
            .map(|id| Future::new(self, id, self.future_poll_interval))
            .collect())
    }

    /// Atomically claims one PENDING task, preferring FIFO-within-ready
    /// insertion order (`rowid`), optionally scoped to one manager and/or
    /// one specific task id (spec §4.3 `pop`, §4.5 worker loop). Returns
    /// `None` when nothing matching is ready.
    pub fn pop(&self, manager_id: Option<Uuid>, task_id: Option<Uuid>) -> Result<Option<Task>, QueueError> {
        self.store.database.retrying_transaction(|conn| {
            if Self::read_state(conn)? == QueueState::Paused {
                return Ok(None);
            }

            let mut query = tasks::table
                .filter(tasks::state.eq(TaskState::Pending.to_string()))
                .into_boxed();
            if let Some(mid) = manager_id {
                query = query.filter(tasks::manager_id.eq(mid.to_string()));
            }
            if let Some(tid) = task_id {
                query = query.filter(tasks::id.eq(tid.to_string()));
            }

            let candidate: Option<TaskRow> = query
                .order(tasks::rowid.asc())
                .select(TaskRow::as_select())
                .first(conn)
                .optional()?;

            let Some(row) = candidate else {
                return Ok(None);
            };

            diesel::update(tasks::table.filter(tasks::id.eq(&row.id)))
                .set((
                    tasks::state.eq(TaskState::Running.to_string()),
                    tasks::heartbeat_at.eq(now_millis()),
                ))
                .execute(conn)?;

            let mut task = row_to_task(row)?;
            task.state = TaskState::Running;
            Ok(Some(task))
        })
    }

    /// Looks up a single task by id regardless of state.
    pub fn get(&self, id: Uuid) -> Result<Option<Task>, QueueError> {
        self.store.database.transaction(|conn| {
            let row: Option<TaskRow> = tasks::table
                .filter(tasks::id.eq(id.to_string()))
                .select(TaskRow::as_select())
                .first(conn)
                .optional()?;
            row.map(row_to_task).transpose()
        })
    }

    /// Writes back a task's terminal (or KILLED/UNKNOWN) outcome and runs
    /// the WAITING -> PENDING cascade for its dependents (spec §4.3
    /// `set_task_state`, §4.2 cascade rule).
    pub fn set_task_state(&self, task: &Task) -> Result<(), QueueError> {
        let id_str = task.id.to_string();
        let payload = encode_task(task)?;
        let promoted = self.store.database.retrying_transaction(|conn| {
            diesel::update(tasks::table.filter(tasks::id.eq(&id_str)))
                .set((tasks::payload.eq(&payload), tasks::state.eq(task.state.to_string())))
                .execute(conn)?;

            if task.state.is_terminal() {
                let ready = cascade::ready_after_terminal(conn, &[task.id])?;
                for id in &ready {
                    diesel::update(tasks::table.filter(tasks::id.eq(id.to_string())))
                        .set(tasks::state.eq(TaskState::Pending.to_string()))
                        .execute(conn)?;
                }
                Ok(ready)
            } else {
                Ok(Vec::new())
            }
        })?;

        if !promoted.is_empty() {
            info!(queue = %self.name, count = promoted.len(), "cascaded tasks to PENDING");
        }
        Ok(())
    }

    /// Marks RUNNING tasks whose heartbeat has been absent for longer than
    /// `stale_after` as UNKNOWN, then runs the WAITING -> PENDING cascade
    /// for their dependents (spec §4.3 reaper). Conservative by design: a
    /// queue is never reaped automatically, only when a caller invokes
    /// this explicitly. Returns the number of tasks reaped.
    pub fn reap(&self, stale_after: Duration) -> Result<usize, QueueError> {
        let reaped = self.store.database.retrying_transaction(|conn| {
            let stale_millis = i64::try_from(stale_after.as_millis()).unwrap_or(i64::MAX);
            let threshold = now_millis().saturating_sub(stale_millis);

            let stale_ids: Vec<String> = tasks::table
                .filter(tasks::state.eq(TaskState::Running.to_string()))
                .filter(tasks::heartbeat_at.lt(threshold))
                .select(tasks::id)
                .load(conn)?;

            if stale_ids.is_empty() {
                return Ok(Vec::new());
            }

            for id in &stale_ids {
                diesel::update(tasks::table.filter(tasks::id.eq(id)))
                    .set(tasks::state.eq(TaskState::Unknown.to_string()))
                    .execute(conn)?;
            }

            let ids: Vec<Uuid> = stale_ids
                .iter()
                .map(|s| Uuid::parse_str(s).map_err(|e| QueueError::StoreCorrupt(e.to_string())))
                .collect::<Result<_, _>>()?;

            let ready = cascade::ready_after_terminal(conn, &ids)?;
            for id in &ready {
                diesel::update(tasks::table.filter(tasks::id.eq(id.to_string())))
                    .set(tasks::state.eq(TaskState::Pending.to_string()))
                    .execute(conn)?;
            }

            Ok(ids)
        })?;

        if !reaped.is_empty() {
            warn!(queue = %self.name, count = reaped.len(), "reaped stale RUNNING tasks to UNKNOWN");
        }
        Ok(reaped.len())
    }

    /// Moves every task in `from_state` back to PENDING (spec §6 `retry`
    /// command; scenarios S5/S6). Returns the number of tasks moved.
    pub fn retry(&self, from_state: TaskState) -> Result<usize, QueueError> {
        self.store.database.retrying_transaction(|conn| {
            let n = diesel::update(tasks::table.filter(tasks::state.eq(from_state.to_string())))
                .set(tasks::state.eq(TaskState::Pending.to_string()))
                .execute(conn)?;
            Ok(n)
        })
    }

    /// Lists tasks matching the given filters.
    pub fn tasks(&self, manager: ManagerFilter, state: StateFilter) -> Result<Vec<Task>, QueueError> {
        self.store.database.transaction(|conn| {
            let mut query = tasks::table.into_boxed();
            if let ManagerFilter::Only(mid) = manager {
                query = query.filter(tasks::manager_id.eq(mid.to_string()));
            }
            if let StateFilter::Only(s) = state {
                query = query.filter(tasks::state.eq(s.to_string()));
            }
            let rows: Vec<TaskRow> = query
                .order(tasks::rowid.asc())
                .select(TaskRow::as_select())
                .load(conn)?;
            rows.into_iter().map(row_to_task).collect()
        })
    }

    /// Counts tasks matching the given filters without decoding payloads.
    pub fn counts(&self, manager: ManagerFilter, state: StateFilter) -> Result<i64, QueueError> {
        self.store.database.transaction(|conn| {
            let mut query = tasks::table.into_boxed();
            if let ManagerFilter::Only(mid) = manager {
                query = query.filter(tasks::manager_id.eq(mid.to_string()));
            }
            if let StateFilter::Only(s) = state {
                query = query.filter(tasks::state.eq(s.to_string()));
            }
            Ok(query.count().get_result(conn)?)
        })
    }

    /// The distinct manager ids that have ever submitted to this queue,
    /// for the spawner loop (spec §4.6) to discover what to watch.
    pub fn managers(&self) -> Result<Vec<Uuid>, QueueError> {
        self.store.database.transaction(|conn| {
            let ids: Vec<String> = managers::table.select(managers::manager_id).distinct().load(conn)?;
            ids.into_iter()
                .map(|s| Uuid::parse_str(&s).map_err(|e| QueueError::StoreCorrupt(e.to_string())))
                .collect()
        })
    }

    /// Decodes a manager's stored configuration blob, if it has one
    /// (spec §4.4 `ManagerConfig`).
    pub fn manager_config<T: for<'de> serde::Deserialize<'de>>(&self, id: Uuid) -> Result<Option<T>, QueueError> {
        self.store.database.transaction(|conn| {
            let payload: Option<Vec<u8>> = managers::table
                .filter(managers::manager_id.eq(id.to_string()))
                .select(managers::payload)
                .first(conn)
                .optional()?;
            payload.map(|p| decode_manager(&p)).transpose()
        })
    }

    /// A per-state breakdown, optionally scoped to one manager (spec §6
    /// `tasks`/`queues` reporting).
    pub fn summary(&self, manager: ManagerFilter) -> Result<BTreeMap<TaskState, i64>, QueueError> {
        let mut out = BTreeMap::new();
        for state in TaskState::ALL {
            let n = self.counts(manager, StateFilter::Only(state))?;
            if n > 0 {
                out.insert(state, n);
            }
        }
        Ok(out)
    }

    fn read_state(conn: &mut SqliteConnection) -> Result<QueueState, QueueError> {
        let row: MetadataRow = metadata::table
            .filter(metadata::key.eq("queue_state"))
            .select(MetadataRow::as_select())
            .first(conn)?;
        QueueState::parse(&row.value)
    }

    pub fn state(&self) -> Result<QueueState, QueueError> {
        self.store.database.transaction(Self::read_state)
    }

    /// Stops `pop` from handing out new work; queued and running tasks are
    /// unaffected (spec §6 `pause`).
    pub fn pause(&self) -> Result<(), QueueError> {
        self.set_state(QueueState::Paused)
    }

    pub fn resume(&self) -> Result<(), QueueError> {
        self.set_state(QueueState::Active)
    }

    fn set_state(&self, state: QueueState) -> Result<(), QueueError> {
        self.store.database.retrying_transaction(|conn| {
            diesel::update(metadata::table.filter(metadata::key.eq("queue_state")))
                .set(metadata::value.eq(state.as_str()))
                .execute(conn)?;
            Ok(())
        })
    }

    /// Removes the queue's directory entirely (spec §6 `delete`).
    pub fn delete(self) -> Result<(), QueueError> {
        warn!(queue = %self.name, "deleting queue");
        self.store.delete()
    }
}
