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

//! The subprocess runner (spec §4.7 "Shell runner"): builds an argv from
//! the task's arguments, forks it under the task's environment snapshot,
//! and maps its exit status back to an errno.

use std::collections::BTreeMap;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;

use crate::app::function::DEFAULT_ERROR_ERRNO;
use crate::traits::App;
use crate::traits::AppRunOutcome;

type ArgvBuilder =
    dyn Fn(&[serde_json::Value], &BTreeMap<String, serde_json::Value>) -> Vec<String> + Send + Sync;

/// Runs a task as a child process. `argv_builder` turns the task's
/// resolved arguments into a program name plus its arguments, the way the
/// original's callable-returns-an-argv-list convention worked.
pub struct ShellApp {
    argv_builder: Box<ArgvBuilder>,
}

impl ShellApp {
    pub fn new<F>(argv_builder: F) -> Self
    where
        F: Fn(&[serde_json::Value], &BTreeMap<String, serde_json::Value>) -> Vec<String> + Send + Sync + 'static,
    {
        ShellApp { argv_builder: Box::new(argv_builder) }
    }
}

impl App for ShellApp {
    fn run(
        &self,
        args: &[serde_json::Value],
        kwargs: &BTreeMap<String, serde_json::Value>,
        environ: &BTreeMap<String, String>,
    ) -> AppRunOutcome {
        let argv = (self.argv_builder)(args, kwargs);
        let Some((program, rest)) = argv.split_first() else {
            return AppRunOutcome {
                errno: DEFAULT_ERROR_ERRNO,
                result: None,
                stderr: "shell app produced an empty argv".to_string(),
                stdout: String::new(),
            };
        };

        let output = Command::new(program).args(rest).env_clear().envs(environ).output();

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let errno = output
                    .status
                    .code()
                    .or_else(|| output.status.signal())
                    .unwrap_or(DEFAULT_ERROR_ERRNO);
                let result = if errno == 0 {
                    Some(serde_json::Value::String(stdout.clone()))
                } else {
                    None
                };
                AppRunOutcome { errno, result, stderr, stdout }
            }
            Err(err) => AppRunOutcome {
                errno: DEFAULT_ERROR_ERRNO,
                result: None,
                stderr: format!("failed to spawn {program}: {err}"),
                stdout: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SIGTERM_ERRNO;

    #[test]
    fn echoes_argument_and_succeeds() {
        let app = ShellApp::new(|args, _kwargs| {
            vec!["echo".to_string(), args[0].as_str().unwrap_or_default().to_string()]
        });
        let outcome = app.run(&[serde_json::json!("hi")], &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(outcome.errno, 0);
        assert_eq!(outcome.stdout.trim(), "hi");
    }

    #[test]
    fn nonzero_exit_is_surfaced_as_errno() {
        let app = ShellApp::new(|_args, _kwargs| vec!["false".to_string()]);
        let outcome = app.run(&[], &BTreeMap::new(), &BTreeMap::new());
        assert_ne!(outcome.errno, 0);
        assert!(outcome.result.is_none());
    }

    #[test]
    fn sigterm_is_mapped_to_the_kill_signal_errno() {
        let app = ShellApp::new(|_args, _kwargs| {
            vec!["sh".to_string(), "-c".to_string(), "kill -TERM $$".to_string()]
        });
        let outcome = app.run(&[], &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(outcome.errno, SIGTERM_ERRNO);
    }
}
