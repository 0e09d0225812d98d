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

//! S2 — Diamond dependency (spec §8): A, B(A), C(A), D(B,C). B and C stay
//! WAITING until A succeeds; D stays WAITING until both B and C succeed.

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

fn identity_registry() -> AppRegistry {
    let mut registry = AppRegistry::new();
    registry.register("node", Arc::new(FunctionApp::new(|args, _kwargs| Ok(args.first().cloned().unwrap_or(serde_json::Value::Null)))));
    registry
}

#[test]
fn diamond_dependency_cascades_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
    let manager = TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

    let a = Task::new("node", vec![Arg::Literal(serde_json::json!("a"))], BTreeMap::new(), manager.id());
    let a_id = a.id;
    let b = Task::new("node", vec![Arg::Require(a_id)], BTreeMap::new(), manager.id());
    let b_id = b.id;
    let c = Task::new("node", vec![Arg::Require(a_id)], BTreeMap::new(), manager.id());
    let c_id = c.id;
    let mut d_kwargs = BTreeMap::new();
    d_kwargs.insert("b".to_string(), Arg::Require(b_id));
    d_kwargs.insert("c".to_string(), Arg::Require(c_id));
    let d = Task::new("node", vec![], d_kwargs, manager.id());
    let d_id = d.id;

    manager.add(&queue, a, ReplacePolicy::Upsert).unwrap();
    manager.add(&queue, b, ReplacePolicy::Upsert).unwrap();
    manager.add(&queue, c, ReplacePolicy::Upsert).unwrap();
    manager.add(&queue, d, ReplacePolicy::Upsert).unwrap();

    assert_eq!(queue.get(b_id).unwrap().unwrap().state, TaskState::Waiting);
    assert_eq!(queue.get(c_id).unwrap().unwrap().state, TaskState::Waiting);
    assert_eq!(queue.get(d_id).unwrap().unwrap().state, TaskState::Waiting);

    let registry = identity_registry();

    // Runs A only (single PENDING task at this point).
    worker::run(&queue, None, None, &registry, &NullEnvironment).unwrap();
    assert_eq!(queue.get(a_id).unwrap().unwrap().state, TaskState::Succeeded);
    assert_eq!(queue.get(b_id).unwrap().unwrap().state, TaskState::Pending);
    assert_eq!(queue.get(c_id).unwrap().unwrap().state, TaskState::Pending);
    assert_eq!(queue.get(d_id).unwrap().unwrap().state, TaskState::Waiting);

    // Drains B and C; D only becomes PENDING once both are done.
    worker::run(&queue, None, None, &registry, &NullEnvironment).unwrap();
    assert_eq!(queue.get(b_id).unwrap().unwrap().state, TaskState::Succeeded);
    assert_eq!(queue.get(c_id).unwrap().unwrap().state, TaskState::Succeeded);
    assert_eq!(queue.get(d_id).unwrap().unwrap().state, TaskState::Pending);

    worker::run(&queue, None, None, &registry, &NullEnvironment).unwrap();
    assert_eq!(queue.get(d_id).unwrap().unwrap().state, TaskState::Succeeded);
}
