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

//! The worker loop (spec §4.5): pop one task, resolve its arguments, run
//! its app, write the outcome back, repeat until the queue has nothing
//! left for this worker.

use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppRegistry;
use crate::error::QueueError;
use crate::queue::Queue;
use crate::task::{Arg, Task, TaskState};
use crate::traits::{Environment, SIGTERM_ERRNO};

/// Substitutes every [`Arg::Require`] in `task` with the referenced
/// task's `result`, failing with [`QueueError::DependencyUnresolved`] if
/// that task is not yet SUCCEEDED (invariant 2, §3).
pub fn resolve_args(task: &Task, queue: &Queue) -> Result<(Vec<serde_json::Value>, std::collections::BTreeMap<String, serde_json::Value>), QueueError> {
    let resolve = |arg: &Arg| -> Result<serde_json::Value, QueueError> {
        match arg {
            Arg::Literal(value) => Ok(value.clone()),
            Arg::Require(id) => {
                let upstream = queue.get(*id)?.ok_or_else(|| QueueError::NotFound(id.to_string()))?;
                if upstream.state != TaskState::Succeeded {
                    return Err(QueueError::DependencyUnresolved(*id));
                }
                Ok(upstream.result.clone().unwrap_or(serde_json::Value::Null))
            }
        }
    };

    let args = task.args.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
    let mut kwargs = std::collections::BTreeMap::new();
    for (key, arg) in &task.kwargs {
        kwargs.insert(key.clone(), resolve(arg)?);
    }
    Ok((args, kwargs))
}

/// Maps an app's errno to the terminal state it represents (spec §4.3
/// state machine, §4.5 step 5).
fn terminal_state_for_errno(errno: i32) -> TaskState {
    match errno {
        0 => TaskState::Succeeded,
        SIGTERM_ERRNO => TaskState::Killed,
        _ => TaskState::Failed,
    }
}

/// Runs the worker loop against `queue`, optionally scoped to one manager
/// and/or one specific task id, exiting once `pop` returns `None`.
/// Returns the number of tasks processed.
pub fn run(
    queue: &Queue,
    manager_id: Option<Uuid>,
    task_id: Option<Uuid>,
    registry: &AppRegistry,
    environment: &dyn Environment,
) -> Result<usize, QueueError> {
    let mut processed = 0usize;

    loop {
        if task_id.is_some() && processed > 0 {
            break;
        }

        let Some(mut task) = queue.pop(manager_id, task_id)? else {
            break;
        };

        processed += 1;
        let started = Instant::now();

        let outcome = match resolve_args(&task, queue) {
            Ok((args, kwargs)) => {
                let app = match registry.get(&task.app_ref) {
                    Ok(app) => app,
                    Err(err) => {
                        warn!(app = %task.app_ref, error = %err, "app not registered");
                        task.state = TaskState::Failed;
                        task.errno = Some(-1);
                        task.stderr = err.to_string();
                        queue.set_task_state(&task)?;
                        continue;
                    }
                };
                app.run(&args, &kwargs, &environment.snapshot())
            }
            Err(QueueError::DependencyUnresolved(id)) => {
                warn!(task = %task.id, requires = %id, "dependency unresolved, failing task");
                task.state = TaskState::Failed;
                task.errno = Some(-1);
                task.stderr = format!("dependency unresolved: {id}");
                queue.set_task_state(&task)?;
                continue;
            }
            Err(err) => return Err(err),
        };

        task.state = terminal_state_for_errno(outcome.errno);
        task.errno = Some(outcome.errno);
        task.result = outcome.result;
        task.stderr = outcome.stderr;
        task.stdout = outcome.stdout;
        task.dtime = Some(started.elapsed().as_secs_f64());

        queue.set_task_state(&task)?;
        info!(task = %task.id, state = %task.state, dtime = task.dtime, "task finished");
    }

    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::function::FunctionError;
    use crate::config::Config;
    use crate::manager::ManagerConfig;
    use crate::provider::LocalProvider;
    use crate::queue::ReplacePolicy;
    use crate::task::{Arg, Task};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct NullEnvironment;
    impl Environment for NullEnvironment {
        fn snapshot(&self) -> BTreeMap<String, String> {
            BTreeMap::new()
        }
    }

    fn registry_with_echo() -> AppRegistry {
        let mut registry = AppRegistry::new();
        registry.register(
            "echo",
            Arc::new(crate::app::function::FunctionApp::new(|args, _kwargs| Ok(args[0].clone()))),
        );
        registry
    }

    #[test]
    fn processes_pending_tasks_until_drained() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
        let manager = crate::manager::TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

        let task = Task::new("echo", vec![Arg::Literal(serde_json::json!("hi"))], BTreeMap::new(), manager.id());
        manager.add(&queue, task.clone(), ReplacePolicy::Upsert).unwrap();

        let n = worker_run(&queue, &registry_with_echo());
        assert_eq!(n, 1);

        let finished = queue.get(task.id).unwrap().unwrap();
        assert_eq!(finished.state, TaskState::Succeeded);
        assert_eq!(finished.result, Some(serde_json::json!("hi")));
    }

    #[test]
    fn dependency_chain_resolves_upstream_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
        let manager = crate::manager::TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

        let upstream = Task::new("echo", vec![Arg::Literal(serde_json::json!(10))], BTreeMap::new(), manager.id());
        let upstream_id = upstream.id;
        let downstream = Task::new("echo", vec![Arg::Require(upstream_id)], BTreeMap::new(), manager.id());
        let downstream_id = downstream.id;

        manager.add(&queue, upstream, ReplacePolicy::Upsert).unwrap();
        manager.add(&queue, downstream, ReplacePolicy::Upsert).unwrap();

        let registry = registry_with_echo();
        worker_run(&queue, &registry);
        worker_run(&queue, &registry);

        let finished = queue.get(downstream_id).unwrap().unwrap();
        assert_eq!(finished.state, TaskState::Succeeded);
        assert_eq!(finished.result, Some(serde_json::json!(10)));
    }

    #[test]
    fn app_errno_maps_to_failed_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
        let manager = crate::manager::TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

        let mut registry = AppRegistry::new();
        registry.register(
            "boom",
            Arc::new(crate::app::function::FunctionApp::new(|_args, _kwargs| {
                Err::<serde_json::Value, _>(FunctionError::with_errno(7, "nope"))
            })),
        );

        let task = Task::new("boom", vec![], BTreeMap::new(), manager.id());
        let id = task.id;
        manager.add(&queue, task, ReplacePolicy::Upsert).unwrap();

        worker_run(&queue, &registry);

        let finished = queue.get(id).unwrap().unwrap();
        assert_eq!(finished.state, TaskState::Failed);
        assert_eq!(finished.errno, Some(7));
    }

    fn worker_run(queue: &Queue, registry: &AppRegistry) -> usize {
        run(queue, None, None, registry, &NullEnvironment).unwrap()
    }
}
