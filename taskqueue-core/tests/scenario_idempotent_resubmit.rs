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

//! S3 — Idempotent resubmit (spec §8): submitting the same (app, args,
//! kwargs) twice with the default `upsert` policy yields the same task id
//! and exactly one row.

use std::collections::BTreeMap;

use taskqueue_core::provider::LocalProvider;
use taskqueue_core::queue::ReplacePolicy;
use taskqueue_core::{Arg, Config, ManagerConfig, ManagerFilter, Queue, StateFilter, Task, TaskManager};

#[test]
fn resubmitting_the_same_task_does_not_duplicate_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
    let manager = TaskManager::new(ManagerConfig::new(BTreeMap::new(), 1), LocalProvider::new());

    let mut kwargs = BTreeMap::new();
    kwargs.insert("y".to_string(), Arg::Literal(serde_json::json!(2)));
    let first = Task::new("f", vec![Arg::Literal(serde_json::json!(1))], kwargs.clone(), manager.id());
    let second = Task::new("f", vec![Arg::Literal(serde_json::json!(1))], kwargs, manager.id());

    assert_eq!(first.id, second.id, "identical (app, args, kwargs) must hash to the same id");

    let id_a = manager.add(&queue, first, ReplacePolicy::Upsert).unwrap().id();
    let id_b = manager.add(&queue, second, ReplacePolicy::Upsert).unwrap().id();
    assert_eq!(id_a, id_b);

    let rows = queue.tasks(ManagerFilter::Any, StateFilter::Any).unwrap();
    assert_eq!(rows.iter().filter(|t| t.id == id_a).count(), 1);
}
