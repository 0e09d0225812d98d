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

//! The in-process function runner (spec §4.7 "Function runner").
//!
//! Redirects stdout/stderr into in-memory buffers for the duration of the
//! call and swaps the process environment for the task's snapshot,
//! restoring both on every exit path including a panic.

use std::collections::BTreeMap;
use std::io::Read;
use std::panic::{catch_unwind, AssertUnwindSafe};

use gag::BufferRedirect;

use crate::traits::{App, AppRunOutcome};

/// errno recorded for a function app that panicked or returned an error
/// with no explicit errno of its own, mirroring the original's fallback.
pub const DEFAULT_ERROR_ERRNO: i32 = 42;

/// An error a function app can return: an explicit errno plus a message
/// that is written to the captured stderr buffer.
#[derive(Debug, Clone)]
pub struct FunctionError {
    pub errno: Option<i32>,
    pub message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        FunctionError { errno: None, message: message.into() }
    }

    pub fn with_errno(errno: i32, message: impl Into<String>) -> Self {
        FunctionError { errno: Some(errno), message: message.into() }
    }
}

type Callable = dyn Fn(&[serde_json::Value], &BTreeMap<String, serde_json::Value>) -> Result<serde_json::Value, FunctionError>
    + Send
    + Sync;

/// Wraps an in-process callable as an [`App`].
pub struct FunctionApp {
    callable: Box<Callable>,
}

impl FunctionApp {
    pub fn new<F>(callable: F) -> Self
    where
        F: Fn(&[serde_json::Value], &BTreeMap<String, serde_json::Value>) -> Result<serde_json::Value, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        FunctionApp { callable: Box::new(callable) }
    }
}

/// Replaces the entire process environment with `environ` and restores the
/// original on drop, covering panics via the caller's `catch_unwind`.
struct EnvGuard {
    previous: BTreeMap<String, String>,
}

impl EnvGuard {
    fn apply(environ: &BTreeMap<String, String>) -> Self {
        let previous: BTreeMap<String, String> = std::env::vars().collect();
        for key in previous.keys() {
            std::env::remove_var(key);
        }
        for (key, value) in environ {
            std::env::set_var(key, value);
        }
        EnvGuard { previous }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        let current: Vec<String> = std::env::vars().map(|(k, _)| k).collect();
        for key in current {
            std::env::remove_var(key);
        }
        for (key, value) in &self.previous {
            std::env::set_var(key, value);
        }
    }
}

impl App for FunctionApp {
    fn run(
        &self,
        args: &[serde_json::Value],
        kwargs: &BTreeMap<String, serde_json::Value>,
        environ: &BTreeMap<String, String>,
    ) -> AppRunOutcome {
        let _env_guard = EnvGuard::apply(environ);

        let mut stdout_redirect = BufferRedirect::stdout().ok();
        let mut stderr_redirect = BufferRedirect::stderr().ok();

        let outcome = catch_unwind(AssertUnwindSafe(|| (self.callable)(args, kwargs)));

        let mut stdout = String::new();
        if let Some(mut r) = stdout_redirect.take() {
            let _ = r.read_to_string(&mut stdout);
        }
        let mut stderr = String::new();
        if let Some(mut r) = stderr_redirect.take() {
            let _ = r.read_to_string(&mut stderr);
        }

        match outcome {
            Ok(Ok(result)) => AppRunOutcome { errno: 0, result: Some(result), stderr, stdout },
            Ok(Err(err)) => {
                stderr.push_str(&err.message);
                stderr.push('\n');
                AppRunOutcome {
                    errno: err.errno.unwrap_or(DEFAULT_ERROR_ERRNO),
                    result: None,
                    stderr,
                    stdout,
                }
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "function app panicked".to_string());
                stderr.push_str(&message);
                stderr.push('\n');
                AppRunOutcome { errno: DEFAULT_ERROR_ERRNO, result: None, stderr, stdout }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn successful_call_captures_stdout_and_result() {
        let app = FunctionApp::new(|args, _kwargs| {
            println!("computing");
            let n = args[0].as_i64().unwrap_or(0);
            Ok(serde_json::json!(n * 2))
        });

        let outcome = app.run(&[serde_json::json!(21)], &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(outcome.errno, 0);
        assert_eq!(outcome.result, Some(serde_json::json!(42)));
        assert!(outcome.stdout.contains("computing"));
    }

    #[test]
    #[serial]
    fn error_without_errno_falls_back_to_default() {
        let app = FunctionApp::new(|_args, _kwargs| Err(FunctionError::new("boom")));
        let outcome = app.run(&[], &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(outcome.errno, DEFAULT_ERROR_ERRNO);
        assert!(outcome.stderr.contains("boom"));
    }

    #[test]
    #[serial]
    fn environment_is_restored_after_run() {
        std::env::set_var("TASKQUEUE_PROBE", "outer");
        let app = FunctionApp::new(|_args, _kwargs| {
            Ok(serde_json::json!(std::env::var("TASKQUEUE_INNER").unwrap_or_default()))
        });
        let mut environ = BTreeMap::new();
        environ.insert("TASKQUEUE_INNER".to_string(), "inner".to_string());
        let outcome = app.run(&[], &BTreeMap::new(), &environ);

        assert_eq!(outcome.result, Some(serde_json::json!("inner")));
        assert_eq!(std::env::var("TASKQUEUE_PROBE").unwrap(), "outer");
        assert!(std::env::var("TASKQUEUE_INNER").is_err());
        std::env::remove_var("TASKQUEUE_PROBE");
    }
}
