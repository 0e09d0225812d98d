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

use anyhow::Result;
use taskqueue_core::{Config, ManagerFilter, StateFilter};
use uuid::Uuid;

use crate::support::{open_queue, parse_state};

pub fn run(
    base_dir: &std::path::Path,
    config: &Config,
    default_user: &str,
    queue: &str,
    tmid: Option<Uuid>,
    id: Option<Uuid>,
    state: &str,
) -> Result<()> {
    let queue = open_queue(base_dir, config, queue, default_user, false)?;
    let manager_filter = tmid.map(ManagerFilter::Only).unwrap_or_default();
    let state_filter = StateFilter::Only(parse_state(state)?);

    let tasks = queue.tasks(manager_filter, state_filter)?;
    let tasks: Vec<_> = match id {
        Some(id) => tasks.into_iter().filter(|t| t.id == id).collect(),
        None => tasks,
    };

    if tasks.is_empty() {
        println!("no tasks matched");
        return Ok(());
    }

    for task in tasks {
        println!(
            "{} {} {} errno={:?} dtime={:?}",
            task.id, task.app_ref, task.state, task.errno, task.dtime
        );
        if !task.stderr.is_empty() {
            println!("  stderr: {}", task.stderr.trim_end());
        }
    }
    Ok(())
}
