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

//! The spawner loop (spec §4.6): watches PENDING counts per manager across
//! a set of queues and asks each manager's provider to keep worker
//! capacity matched to demand.

use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::QueueError;
use crate::queue::{ManagerFilter, Queue, QueueState, StateFilter};
use crate::task::TaskState;
use crate::traits::Provider;

/// Builds the worker command line for a given queue/manager pair. The
/// spawner has no opinion on argv shape beyond "parameterized with
/// (queue_name, manager_id)" (spec §4.6); callers supply the concrete
/// binary and flag names (typically `<worker-binary> work -q <queue>
/// --tmid <manager_id>`).
pub trait CommandLineBuilder: Send + Sync {
    fn build(&self, queue_name: &str, manager_id: Uuid) -> Vec<String>;
}

/// One manager known to the spawner: its id, `max_workers`, and the
/// provider to ask for workers.
pub struct ManagedWorkerPool<'a> {
    pub manager_id: Uuid,
    pub max_workers: usize,
    pub provider: &'a dyn Provider,
}

/// Runs the spawner loop against `queues` until `timeout` elapses or every
/// queue is PAUSED. `managers_for` returns the managers the spawner should
/// track for a given queue (typically every manager that has ever
/// submitted to it); `command_line` builds the worker invocation.
///
/// Returns the number of sleep/poll iterations performed, mostly useful
/// for tests.
pub fn run(
    queues: &[(&str, &Queue)],
    managers_for: impl Fn(&Queue) -> Result<Vec<ManagedWorkerPool>, QueueError>,
    command_line: &dyn CommandLineBuilder,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<usize, QueueError> {
    let start = Instant::now();
    let mut iterations = 0usize;

    loop {
        let mut all_paused = true;

        for (name, queue) in queues {
            if queue.state()? == QueueState::Paused {
                continue;
            }
            all_paused = false;

            for pool in managers_for(queue)? {
                let pending = queue.counts(ManagerFilter::Only(pool.manager_id), StateFilter::Only(TaskState::Pending))?;
                if pending <= 0 {
                    continue;
                }
                let ntasks = pending as usize;
                let command = command_line.build(name, pool.manager_id);
                debug!(queue = name, manager = %pool.manager_id, pending, "spawner ensuring worker capacity");
                pool.provider.launch(&command, ntasks, pool.max_workers).map_err(|err| {
                    QueueError::StoreCorrupt(format!("provider launch failed: {err}"))
                })?;
            }
        }

        iterations += 1;

        if all_paused || start.elapsed() >= timeout {
            info!(iterations, "spawner loop exiting");
            return Ok(iterations);
        }

        let jitter: f64 = rand::thread_rng().gen_range(0.8..1.2);
        let sleep_for = poll_interval.mul_f64(jitter);
        let remaining = timeout.saturating_sub(start.elapsed());
        thread::sleep(sleep_for.min(remaining.max(Duration::from_millis(1))));
    }
}

/// A [`CommandLineBuilder`] that re-invokes the current executable's
/// `work` subcommand, the way [`crate::provider::LocalProvider`] expects
/// (spec §4.6 "running the worker command parameterized with
/// (queue_name, manager_id)").
pub struct SelfExeCommandLine {
    pub exe: String,
    pub extra_args: Vec<String>,
}

impl CommandLineBuilder for SelfExeCommandLine {
    fn build(&self, queue_name: &str, manager_id: Uuid) -> Vec<String> {
        let mut argv = vec![self.exe.clone(), "work".to_string(), "-q".to_string(), queue_name.to_string()];
        argv.extend(self.extra_args.iter().cloned());
        argv.push("--tmid".to_string());
        argv.push(manager_id.to_string());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::manager::{ManagerConfig, TaskManager};
    use crate::provider::LocalProvider;
    use crate::queue::ReplacePolicy;
    use crate::task::{Arg, Task};
    use std::collections::BTreeMap as Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider(Arc<AtomicUsize>);
    impl Provider for CountingProvider {
        fn launch(&self, _command_line: &[String], _ntasks: usize, _max_workers: usize) -> Result<(), crate::error::AppError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn launches_workers_for_pending_tasks_then_stops_when_drained() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
        let manager = TaskManager::new(ManagerConfig::new(Map::new(), 2), LocalProvider::new());
        let task = Task::new("echo", vec![Arg::Literal(serde_json::json!(1))], Map::new(), manager.id());
        manager.add(&queue, task, ReplacePolicy::Upsert).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider(calls.clone());
        let command = SelfExeCommandLine { exe: "taskqueue-cli".to_string(), extra_args: vec![] };

        let manager_id = manager.id();
        let iterations = run(
            &[("q", &queue)],
            |_q| {
                Ok(vec![ManagedWorkerPool {
                    manager_id,
                    max_workers: 2,
                    provider: &provider,
                }])
            },
            &command,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .unwrap();

        assert!(iterations >= 1);
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn paused_queue_is_skipped_and_loop_exits_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let queue = Queue::open(dir.path(), "default", "q", true, &config).unwrap();
        queue.pause().unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider(calls.clone());
        let command = SelfExeCommandLine { exe: "taskqueue-cli".to_string(), extra_args: vec![] };

        run(
            &[("q", &queue)],
            |_q| Ok(vec![ManagedWorkerPool { manager_id: Uuid::new_v4(), max_workers: 1, provider: &provider }]),
            &command,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
