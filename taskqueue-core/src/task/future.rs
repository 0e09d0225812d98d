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

//! A client-side handle to a submitted task's eventual outcome (spec §4.3
//! `add`, Glossary `Future`). Mirrors the original's `Future.result`: poll
//! the queue for this task's state until it reaches a terminal state or an
//! overall timeout expires, sleeping a jittered interval between polls.

use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use crate::error::QueueError;
use crate::queue::Queue;
use crate::task::Task;

/// Returned one-per-task by [`crate::queue::Queue::add`]. Borrows the queue
/// it was created against, so it cannot outlive it.
pub struct Future<'a> {
    queue: &'a Queue,
    id: Uuid,
    poll_interval: Duration,
}

impl<'a> Future<'a> {
    pub fn new(queue: &'a Queue, id: Uuid, poll_interval: Duration) -> Self {
        Future { queue, id, poll_interval }
    }

    /// The id of the task this future resolves.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Blocks until the task reaches a terminal state, returning it, or
    /// until `timeout` elapses, in which case `Err(QueueError::Timeout)` is
    /// returned (spec §9 `Future.result` consumer).
    pub fn result(&self, timeout: Duration) -> Result<Task, QueueError> {
        let start = Instant::now();
        loop {
            let task = self
                .queue
                .get(self.id)?
                .ok_or_else(|| QueueError::NotFound(self.id.to_string()))?;
            if task.state.is_terminal() {
                return Ok(task);
            }
            if start.elapsed() >= timeout {
                return Err(QueueError::Timeout(self.id, timeout));
            }
            let jitter: f64 = rand::thread_rng().gen_range(0.8..1.2);
            let remaining = timeout.saturating_sub(start.elapsed());
            thread::sleep(self.poll_interval.mul_f64(jitter).min(remaining.max(Duration::from_millis(1))));
        }
    }
}
