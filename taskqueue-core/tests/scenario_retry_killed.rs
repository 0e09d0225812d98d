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

//! S5 — Retry killed (spec §8): a task SIGTERM'd mid-RUNNING becomes
//! KILLED; `retry(KILLED)` returns it to PENDING and it then succeeds.

use std::collections::BTreeMap;
use std::sync::Arc;

use taskqueue_core::app::function::FunctionApp;
use taskqueue_core::app::AppRegistry;
use taskqueue_core::provider::LocalProvider;
use taskqueue_core::queue::ReplacePolicy;
use taskqueue_core::{worker, Arg, Config, ManagerConfig, Queue, Task, TaskManager, TaskState};

struct NullEnvironment;
impl taskqueue_core::traits::Environment for NullEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

fn noop_registry() -> AppRegistry {
    let mut registry = AppRegistry::new();
    registry.register("noop", Arc::new(FunctionApp::new(|_args, _kwargs| Ok(serde_json::Value::Null))));
    registry
}

#[test]
fn killed_task_is_retried_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
    let manager = TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

    let task = Task::new("noop", vec![], BTreeMap::new(), manager.id());
    let id = task.id;
    manager.add(&queue, task, ReplacePolicy::Upsert).unwrap();

    // Simulate a worker SIGTERM'd mid-RUNNING.
    let mut running = queue.pop(None, None).unwrap().unwrap();
    assert_eq!(running.state, TaskState::Running);
    running.state = TaskState::Killed;
    running.errno = Some(taskqueue_core::traits::SIGTERM_ERRNO);
    queue.set_task_state(&running).unwrap();
    assert_eq!(queue.get(id).unwrap().unwrap().state, TaskState::Killed);

    let retried = queue.retry(TaskState::Killed).unwrap();
    assert_eq!(retried, 1);
    assert_eq!(queue.get(id).unwrap().unwrap().state, TaskState::Pending);

    let registry = noop_registry();
    let processed = worker::run(&queue, None, None, &registry, &NullEnvironment).unwrap();
    assert_eq!(processed, 1);
    assert_eq!(queue.get(id).unwrap().unwrap().state, TaskState::Succeeded);
}
