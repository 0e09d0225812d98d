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

//! Collaborator contracts the core depends on but does not implement
//! (spec §6): `Provider`, `Environment`, and `App`. Only a reference
//! `Provider` (local subprocess fork) ships in this crate; batch-scheduler
//! integrations are out of scope (spec §1).

use std::collections::BTreeMap;

use crate::error::AppError;

/// Launches worker processes on behalf of a task manager. Implementations
/// must be idempotent: repeated `launch` calls for the same command line
/// should coalesce into at most `max_workers` concurrent workers rather
/// than piling up duplicates.
pub trait Provider: Send + Sync {
    /// Ensures up to `min(ntasks, max_workers)` workers running
    /// `command_line` exist. Fire-and-forget: does not wait for workers to
    /// finish or report their outcome.
    fn launch(&self, command_line: &[String], ntasks: usize, max_workers: usize) -> Result<(), AppError>;
}

/// Produces the environment snapshot a task's app should run under.
pub trait Environment: Send + Sync {
    fn snapshot(&self) -> BTreeMap<String, String>;
}

/// The app execution contract (spec §4.7): run with resolved args/kwargs
/// and an environment snapshot, get back an errno, a result value, and
/// captured stderr/stdout.
pub trait App: Send + Sync {
    fn run(
        &self,
        args: &[serde_json::Value],
        kwargs: &BTreeMap<String, serde_json::Value>,
        environ: &BTreeMap<String, String>,
    ) -> AppRunOutcome;
}

/// The `(errno, result, stderr, stdout)` tuple spec §4.7 names, as a
/// struct rather than a positional tuple so call sites read clearly.
#[derive(Debug, Clone)]
pub struct AppRunOutcome {
    pub errno: i32,
    pub result: Option<serde_json::Value>,
    pub stderr: String,
    pub stdout: String,
}

/// SIGTERM's numeric value on unix, used to recognize the KILLED case
/// (spec §4.3 state machine).
pub const SIGTERM_ERRNO: i32 = 15;
