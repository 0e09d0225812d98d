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

//! S6 — Crash-resume (spec §8): a worker dies mid-task, leaving it stuck
//! RUNNING; an operator reaps it to UNKNOWN and `retry --state UNKNOWN`
//! re-queues it for a fresh worker.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

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
fn crashed_worker_leaves_task_running_until_reaped_and_retried() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
    let manager = TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

    let task = Task::new("noop", vec![], BTreeMap::new(), manager.id());
    let id = task.id;
    manager.add(&queue, task, ReplacePolicy::Upsert).unwrap();

    // The crashed worker popped it but never wrote an outcome back.
    let crashed = queue.pop(None, None).unwrap().unwrap();
    assert_eq!(crashed.state, TaskState::Running);
    assert!(queue.pop(None, None).unwrap().is_none(), "nothing else is PENDING while it sits RUNNING");

    // A new worker against the same queue observes it still RUNNING, not
    // lost. An operator decides it is stale and reaps it to UNKNOWN.
    let stale = queue.get(id).unwrap().unwrap();
    assert_eq!(stale.state, TaskState::Running);
    let reaped = queue.reap(Duration::from_secs(0)).unwrap();
    assert_eq!(reaped, 1);
    assert_eq!(queue.get(id).unwrap().unwrap().state, TaskState::Unknown);

    let retried = queue.retry(TaskState::Unknown).unwrap();
    assert_eq!(retried, 1);
    assert_eq!(queue.get(id).unwrap().unwrap().state, TaskState::Pending);

    let registry = noop_registry();
    let processed = worker::run(&queue, None, None, &registry, &NullEnvironment).unwrap();
    assert_eq!(processed, 1);
    assert_eq!(queue.get(id).unwrap().unwrap().state, TaskState::Succeeded);
}
