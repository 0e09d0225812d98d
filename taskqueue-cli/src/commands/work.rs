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
use taskqueue_core::{worker, Config};
use tracing::info;
use uuid::Uuid;

use crate::environment::OsEnvironment;
use crate::registry;
use crate::support::open_queue;

pub fn run(base_dir: &std::path::Path, config: &Config, default_user: &str, queue: &str, tmid: Option<Uuid>, id: Option<Uuid>) -> Result<()> {
    let queue = open_queue(base_dir, config, queue, default_user, false)?;
    let registry = registry::build();
    let processed = worker::run(&queue, tmid, id, &registry, &OsEnvironment)?;
    info!(processed, queue = queue.name(), "worker loop finished");
    println!("processed {processed} task(s)");
    Ok(())
}
