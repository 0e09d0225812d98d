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
use taskqueue_core::Config;

use crate::support::{open_queue, parse_state};

pub fn run(base_dir: &std::path::Path, config: &Config, default_user: &str, queues: &[String], state: &str) -> Result<()> {
    let state = parse_state(state)?;
    for addr in queues {
        let queue = open_queue(base_dir, config, addr, default_user, false)?;
        let n = queue.retry(state)?;
        println!("{addr}: moved {n} task(s) from {state} to PENDING");
    }
    Ok(())
}
