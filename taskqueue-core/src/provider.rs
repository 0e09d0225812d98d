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

//! [`LocalProvider`]: the one concrete [`Provider`] this crate ships,
//! launching workers as child processes of the current host (spec §4.6's
//! "local" case; batch-scheduler providers are out of scope — §1
//! Non-goals).

use std::collections::HashMap;
use std::process::{Child, Command};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::AppError;
use crate::traits::Provider;

/// Launches and tracks worker children of the current process, coalescing
/// repeated `launch` calls into at most `max_workers` live children per
/// distinct command line.
pub struct LocalProvider {
    children: Mutex<HashMap<Vec<String>, Vec<Child>>>,
}

impl LocalProvider {
    pub fn new() -> Self {
        LocalProvider { children: Mutex::new(HashMap::new()) }
    }

    fn reap(children: &mut Vec<Child>) {
        children.retain_mut(|child| match child.try_wait() {
            Ok(Some(_status)) => false,
            Ok(None) => true,
            Err(_) => false,
        });
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for LocalProvider {
    fn launch(&self, command_line: &[String], ntasks: usize, max_workers: usize) -> Result<(), AppError> {
        let Some((program, rest)) = command_line.split_first() else {
            return Err(AppError::Failed { errno: 1, message: "empty command line".to_string() });
        };

        let target = ntasks.min(max_workers);
        let mut children = self.children.lock().expect("provider lock poisoned");
        let live = children.entry(command_line.to_vec()).or_default();
        Self::reap(live);

        let to_launch = target.saturating_sub(live.len());
        debug!(program, live = live.len(), target, to_launch, "provider ensuring worker capacity");

        for _ in 0..to_launch {
            match Command::new(program).args(rest).spawn() {
                Ok(child) => live.push(child),
                Err(err) => {
                    warn!(program, error = %err, "failed to launch worker");
                    return Err(AppError::Failed { errno: 1, message: err.to_string() });
                }
            }
        }

        Ok(())
    }
}
