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

//! The [`Environment`] a worker process exposes to apps: the host's own
//! process environment, snapshotted fresh on every call.

use std::collections::BTreeMap;

use taskqueue_core::traits::Environment;

pub struct OsEnvironment;

impl Environment for OsEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        std::env::vars().collect()
    }
}
