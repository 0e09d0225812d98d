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

//! App runners (spec §4.7): the two ways a task's `app_ref` is turned into
//! a running program.

pub mod function;
pub mod shell;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::traits::App;

/// Looks up registered [`App`]s by the stable name stored in `Task::app_ref`.
///
/// A real deployment registers its apps once at startup (function apps) or
/// relies entirely on shell apps addressed by name; either way the registry
/// is the only place `app_ref` strings are resolved, keeping that mapping
/// out of the queue itself.
#[derive(Clone, Default)]
pub struct AppRegistry {
    apps: BTreeMap<String, Arc<dyn App>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        AppRegistry { apps: BTreeMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, app: Arc<dyn App>) {
        self.apps.insert(name.into(), app);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn App>, AppError> {
        self.apps.get(name).cloned().ok_or_else(|| AppError::NotFound(name.to_string()))
    }
}
