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

//! Builds the [`AppRegistry`] a worker process runs against.
//!
//! The core is app-agnostic (spec §1 Non-goals: app code is an external
//! collaborator), so the CLI ships one generic `App` registered under the
//! stable name `"shell"`: its positional arguments are the argv, taken
//! literally. Embedders that need in-process `FunctionApp`s link
//! `taskqueue-core` directly and build their own registry instead of
//! going through this binary.

use std::sync::Arc;

use taskqueue_core::app::shell::ShellApp;
use taskqueue_core::app::AppRegistry;

pub fn build() -> AppRegistry {
    let mut registry = AppRegistry::new();
    registry.register(
        "shell",
        Arc::new(ShellApp::new(|args, _kwargs| {
            args.iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })),
    );
    registry
}
