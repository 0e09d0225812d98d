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

//! Shared helpers for the command modules: resolving a `Cli` + `Config`
//! pair down to an open [`Queue`].

use anyhow::{Context, Result};
use taskqueue_core::{Config, Queue};

use crate::address::QueueAddress;

pub fn open_queue(base_dir: &std::path::Path, config: &Config, addr: &str, default_user: &str, create: bool) -> Result<Queue> {
    let addr = QueueAddress::parse(addr, default_user);
    Queue::open(base_dir, &addr.user, &addr.name, create, config)
        .with_context(|| format!("opening queue {}/{}", addr.user, addr.name))
}

pub fn parse_state(s: &str) -> Result<taskqueue_core::TaskState> {
    use std::str::FromStr;
    taskqueue_core::TaskState::from_str(&s.to_uppercase())
        .map_err(|e| anyhow::anyhow!("invalid task state {:?}: {e}", s))
}
