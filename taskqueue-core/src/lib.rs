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

//! Durable task queue and dispatch core.
//!
//! This crate implements a single-file, multi-process task queue: callers
//! submit [`Task`]s carrying a serialized payload and a set of dependency
//! edges, a [`Queue`] persists them to an embedded SQLite store and runs the
//! WAITING -> PENDING -> RUNNING -> terminal state machine, and a
//! [`worker`] / [`spawner`] pair of loops drain the queue against a pool of
//! worker processes.
//!
//! The queue is the source of truth. Workers are stateless: they pop one
//! task, run it, write the result back, and loop. The spawner watches
//! PENDING counts per [`manager::TaskManager`] and asks a pluggable
//! [`traits::Provider`] to keep worker capacity matched to demand.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod manager;
pub mod models;
pub mod provider;
pub mod queue;
pub mod spawner;
pub mod task;
pub mod traits;
pub mod worker;

pub use config::Config;
pub use error::{AppError, QueueError};
pub use manager::{ManagerConfig, TaskManager};
pub use queue::{ManagerFilter, Queue, QueueState, StateFilter};
pub use task::{Arg, Future, Task, TaskState};
