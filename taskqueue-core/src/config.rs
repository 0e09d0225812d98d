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

//! Process-wide configuration, loadable from the environment with
//! programmatic overrides for tests.

use std::path::PathBuf;
use std::time::Duration;

const ENV_BASE_DIR: &str = "TASKQUEUE_BASE_DIR";
const ENV_DEFAULT_USER: &str = "TASKQUEUE_USER";
const DEFAULT_USER: &str = "default";

/// Runtime configuration for queue addressing, store retry budgets, and
/// loop timing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory under which `<user>/<queue>/queue.sqlite` files live.
    pub base_dir: PathBuf,
    /// User namespace used when a queue is addressed without a `user/`
    /// prefix (spec §6 queue naming).
    pub default_user: String,
    /// Wall-clock budget for the store's busy/locked retry loop (spec §4.1).
    pub store_busy_timeout: Duration,
    /// Base interval between retries of a busy store transaction, jittered
    /// by `0.8..1.2x` the same way the original implementation jitters its
    /// sleeps.
    pub store_retry_interval: Duration,
    /// Spawner poll interval (spec §4.6), jittered the same way.
    pub spawner_poll_interval: Duration,
    /// `Future`-style polling interval used by callers waiting on a task's
    /// terminal state.
    pub future_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".taskqueue"),
            default_user: DEFAULT_USER.to_string(),
            store_busy_timeout: Duration::from_secs(120),
            store_retry_interval: Duration::from_millis(200),
            spawner_poll_interval: Duration::from_secs(10),
            future_poll_interval: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(base_dir) = std::env::var(ENV_BASE_DIR) {
            config.base_dir = PathBuf::from(base_dir);
        }
        if let Ok(user) = std::env::var(ENV_DEFAULT_USER) {
            config.default_user = user;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn from_env_overrides_base_dir() {
        std::env::set_var(ENV_BASE_DIR, "/tmp/taskqueue-test-config");
        let config = Config::from_env();
        assert_eq!(config.base_dir, PathBuf::from("/tmp/taskqueue-test-config"));
        std::env::remove_var(ENV_BASE_DIR);
    }

    #[test]
    #[serial]
    fn default_user_falls_back() {
        std::env::remove_var(ENV_DEFAULT_USER);
        let config = Config::from_env();
        assert_eq!(config.default_user, DEFAULT_USER);
    }
}
