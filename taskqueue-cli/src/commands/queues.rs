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
use taskqueue_core::{Config, ManagerFilter};

use crate::address::QueueGlob;

/// Walks `<base_dir>/<user>/<name>/queue.sqlite` looking for entries whose
/// `user/name` matches `glob` (spec §6 `queues -q GLOB`).
fn discover(base_dir: &std::path::Path, glob: &QueueGlob) -> Vec<(String, String)> {
    let mut matches = Vec::new();
    let Ok(users) = std::fs::read_dir(base_dir) else {
        return matches;
    };
    for user_entry in users.flatten() {
        if !user_entry.path().is_dir() {
            continue;
        }
        let user = user_entry.file_name().to_string_lossy().into_owned();
        let Ok(names) = std::fs::read_dir(user_entry.path()) else {
            continue;
        };
        for name_entry in names.flatten() {
            let path = name_entry.path();
            if !path.join("queue.sqlite").exists() {
                continue;
            }
            let name = name_entry.file_name().to_string_lossy().into_owned();
            if glob.matches(&user, &name) {
                matches.push((user.clone(), name));
            }
        }
    }
    matches.sort();
    matches
}

pub fn run(base_dir: &std::path::Path, config: &Config, default_user: &str, glob: &str) -> Result<()> {
    let glob = QueueGlob::parse(glob, default_user);
    let found = discover(base_dir, &glob);

    if found.is_empty() {
        println!("no queues matched");
        return Ok(());
    }

    for (user, name) in found {
        let queue = taskqueue_core::Queue::open(base_dir, &user, &name, false, config)?;
        let state = queue.state()?;
        let summary = queue.summary(ManagerFilter::Any)?;
        let counts: Vec<String> = summary.into_iter().map(|(s, n)| format!("{s}={n}")).collect();
        println!("{user}/{name} [{state:?}] {}", counts.join(" "));
    }
    Ok(())
}
