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

//! Error taxonomy for the queue core.
//!
//! [`QueueError`] distinguishes the error kinds a caller needs to react to
//! (addressing errors, busy stores, fatal invariant violations) from the
//! ones the store layer retries internally and never lets escape.

use uuid::Uuid;

/// Errors surfaced by queue and store operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Queue name failed the `^[A-Za-z0-9_-]+$` pattern.
    #[error("invalid queue name: {0}")]
    NameInvalid(String),

    /// `open(create = true)` was called for a queue that already exists.
    #[error("queue already exists: {0}")]
    AlreadyExists(String),

    /// The requested queue, task, or manager does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store could not acquire its write lock before the configured
    /// wall-clock retry budget elapsed.
    #[error("store busy: failed to acquire lock within {0:?}")]
    StoreBusy(std::time::Duration),

    /// An unrecoverable store-level error (schema mismatch, corrupted
    /// database file). Never retried.
    #[error("store corrupt: {0}")]
    StoreCorrupt(String),

    /// A worker tried to resolve an argument from a task that was not yet
    /// SUCCEEDED. This indicates invariant 2 (§3) was violated.
    #[error("dependency unresolved: task {0} is required but not SUCCEEDED")]
    DependencyUnresolved(Uuid),

    /// A task with this id already exists and the caller asked for
    /// reject-existing semantics.
    #[error("duplicate task id: {0}")]
    DuplicateId(Uuid),

    /// A [`crate::task::Future::result`] call's wall-clock budget elapsed
    /// before the task reached a terminal state.
    #[error("timed out waiting for task {0} after {1:?}")]
    Timeout(Uuid, std::time::Duration),

    /// The submitted dependency graph contains a cycle.
    #[error("cyclic dependency graph: {0}")]
    CyclicDependency(String),

    /// A connection could not be obtained from the pool.
    #[error("connection pool error: {0}")]
    ConnectionPool(#[from] diesel::r2d2::PoolError),

    /// A Diesel-level database error that is not a retryable busy/locked
    /// condition.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failure encoding or decoding a task/manager payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while creating or removing queue directories.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The outcome of running an app: surfaced by the worker, never treated as
/// a core error. The core only records it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The app function panicked or returned an application-level error.
    #[error("app error (errno {errno}): {message}")]
    Failed { errno: i32, message: String },

    /// The app (or its subprocess) was terminated by SIGTERM.
    #[error("app killed by SIGTERM")]
    Killed,

    /// The named app is not registered.
    #[error("app not found: {0}")]
    NotFound(String),
}
