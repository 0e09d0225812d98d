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

//! In-memory task representation and identity.
//!
//! A [`Task`] is a single invocation of a registered [`crate::app::App`]: a
//! name, a set of positional/keyword arguments (each either a literal value
//! or a reference to another task's result), and whatever the queue has
//! recorded about its execution so far.

pub mod future;
pub mod identity;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use future::Future;
pub use identity::compute_id;

/// One task argument: either a literal JSON value or a placeholder that
/// must be substituted with another task's result before execution.
///
/// This is the tagged-variant replacement (§9 design notes) for the
/// original implementation's runtime type check on submitted arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Arg {
    Literal(serde_json::Value),
    Require(Uuid),
}

impl Arg {
    pub fn require_id(&self) -> Option<Uuid> {
        match self {
            Arg::Require(id) => Some(*id),
            Arg::Literal(_) => None,
        }
    }
}

/// The task state machine (spec §3/§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Waiting,
    Pending,
    Running,
    Succeeded,
    Failed,
    Killed,
    Unknown,
}

impl TaskState {
    pub const ALL: [TaskState; 7] = [
        TaskState::Waiting,
        TaskState::Pending,
        TaskState::Running,
        TaskState::Succeeded,
        TaskState::Failed,
        TaskState::Killed,
        TaskState::Unknown,
    ];

    /// Terminal states never transition on their own; only an explicit
    /// operator `retry` moves them back to PENDING (invariant 4).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Killed | TaskState::Unknown
        )
    }

    /// States that count as "still resolving" for the cascade's unresolved
    /// dependency count (§4.3 cascade algorithm).
    pub fn blocks_dependents(&self) -> bool {
        matches!(
            self,
            TaskState::Waiting | TaskState::Pending | TaskState::Running
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Waiting => "WAITING",
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Succeeded => "SUCCEEDED",
            TaskState::Failed => "FAILED",
            TaskState::Killed => "KILLED",
            TaskState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING" => Ok(TaskState::Waiting),
            "PENDING" => Ok(TaskState::Pending),
            "RUNNING" => Ok(TaskState::Running),
            "SUCCEEDED" => Ok(TaskState::Succeeded),
            "FAILED" => Ok(TaskState::Failed),
            "KILLED" => Ok(TaskState::Killed),
            "UNKNOWN" => Ok(TaskState::Unknown),
            other => Err(format!("unrecognized task state: {other}")),
        }
    }
}

/// A single invocation of an app, with concrete arguments and a persistent,
/// content-derived id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub app_ref: String,
    pub args: Vec<Arg>,
    pub kwargs: BTreeMap<String, Arg>,
    pub state: TaskState,
    pub manager_id: Uuid,
    pub job_id: Option<String>,
    pub errno: Option<i32>,
    pub stderr: String,
    pub stdout: String,
    pub result: Option<serde_json::Value>,
    pub dtime: Option<f64>,
}

impl Task {
    /// Builds a new task for submission. `state` is left unset here; the
    /// queue determines WAITING vs PENDING from whether `requires()` is
    /// non-empty at add-time (spec §3 Lifecycle).
    pub fn new(
        app_ref: impl Into<String>,
        args: Vec<Arg>,
        kwargs: BTreeMap<String, Arg>,
        manager_id: Uuid,
    ) -> Self {
        let app_ref = app_ref.into();
        let id = compute_id(&app_ref, &args, &kwargs);
        Task {
            id,
            app_ref,
            args,
            kwargs,
            state: TaskState::Pending,
            manager_id,
            job_id: None,
            errno: None,
            stderr: String::new(),
            stdout: String::new(),
            result: None,
            dtime: None,
        }
    }

    /// The set of task ids this task depends on, from both positional and
    /// keyword arguments (mirrors the original's `Task.require_ids`, which
    /// unions `args_require_ids` and `kwargs_require_ids`).
    pub fn requires(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.args.iter().filter_map(Arg::require_id).collect();
        ids.extend(self.kwargs.values().filter_map(Arg::require_id));
        ids.sort();
        ids.dedup();
        ids
    }

    /// The state a freshly-submitted task should start in: WAITING if it
    /// has any requires, else PENDING (spec §3 Lifecycle).
    pub fn initial_state(&self) -> TaskState {
        if self.requires().is_empty() {
            TaskState::Pending
        } else {
            TaskState::Waiting
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mgr() -> Uuid {
        Uuid::nil()
    }

    #[test]
    fn requires_unions_args_and_kwargs() {
        let req_a = Uuid::new_v4();
        let req_b = Uuid::new_v4();
        let mut kwargs = BTreeMap::new();
        kwargs.insert("b".to_string(), Arg::Require(req_b));
        kwargs.insert("c".to_string(), Arg::Literal(serde_json::json!(1)));
        let task = Task::new(
            "double",
            vec![Arg::Require(req_a), Arg::Literal(serde_json::json!(2))],
            kwargs,
            mgr(),
        );
        let mut requires = task.requires();
        requires.sort();
        let mut expected = vec![req_a, req_b];
        expected.sort();
        assert_eq!(requires, expected);
    }

    #[test]
    fn initial_state_depends_on_requires() {
        let with_req = Task::new("f", vec![Arg::Require(Uuid::new_v4())], BTreeMap::new(), mgr());
        assert_eq!(with_req.initial_state(), TaskState::Waiting);

        let without_req = Task::new("f", vec![Arg::Literal(serde_json::json!(1))], BTreeMap::new(), mgr());
        assert_eq!(without_req.initial_state(), TaskState::Pending);
    }

    #[test]
    fn task_state_round_trips_through_display_and_from_str() {
        for state in TaskState::ALL {
            let s = state.to_string();
            assert_eq!(TaskState::from_str(&s).unwrap(), state);
        }
    }
}
