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

use std::time::Duration;

use anyhow::Result;
use taskqueue_core::provider::LocalProvider;
use taskqueue_core::spawner::{self, ManagedWorkerPool, SelfExeCommandLine};
use taskqueue_core::{Config, ManagerConfig, Queue};

use crate::support::open_queue;

pub fn run(base_dir: &std::path::Path, config: &Config, default_user: &str, queues: &[String], timeout_secs: u64) -> Result<()> {
    let opened: Vec<(String, Queue)> = queues
        .iter()
        .map(|addr| Ok((addr.clone(), open_queue(base_dir, config, addr, default_user, false)?)))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<(&str, &Queue)> = opened.iter().map(|(name, q)| (name.as_str(), q)).collect();

    let provider = LocalProvider::new();
    let exe = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "taskqueue".to_string());
    let command_line = SelfExeCommandLine { exe, extra_args: Vec::new() };

    let iterations = spawner::run(
        &refs,
        |queue| {
            queue
                .managers()?
                .into_iter()
                .map(|manager_id| {
                    let max_workers = queue
                        .manager_config::<ManagerConfig>(manager_id)?
                        .map(|c| c.max_workers)
                        .unwrap_or(1);
                    Ok(ManagedWorkerPool { manager_id, max_workers, provider: &provider })
                })
                .collect()
        },
        &command_line,
        Duration::from_secs(timeout_secs),
        config.spawner_poll_interval,
    )?;

    println!("spawner loop finished after {iterations} iteration(s)");
    Ok(())
}
