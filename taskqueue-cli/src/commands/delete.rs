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

use anyhow::{bail, Result};
use taskqueue_core::Config;

use crate::support::open_queue;

pub fn run(base_dir: &std::path::Path, config: &Config, default_user: &str, queues: &[String], force: bool) -> Result<()> {
    if !force {
        bail!("refusing to delete {} queue(s) without --force", queues.len());
    }
    for addr in queues {
        let queue = open_queue(base_dir, config, addr, default_user, false)?;
        queue.delete()?;
        println!("{addr} deleted");
    }
    Ok(())
}
