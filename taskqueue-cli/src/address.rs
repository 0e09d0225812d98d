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

//! Queue addressing (spec §6): an optional `user/queue` prefix, falling
//! back to the configured default user when only a bare name is given.

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAddress {
    pub user: String,
    pub name: String,
}

impl QueueAddress {
    pub fn parse(raw: &str, default_user: &str) -> Self {
        match raw.split_once('/') {
            Some((user, name)) => QueueAddress {
                user: user.to_string(),
                name: name.to_string(),
            },
            None => QueueAddress {
                user: default_user.to_string(),
                name: raw.to_string(),
            },
        }
    }
}

/// Turns a shell-style glob (`*` only) into an anchored regex.
fn glob_to_regex(glob: &str) -> Regex {
    let mut pattern = String::from("^");
    for part in glob.split('*') {
        pattern.push_str(&regex::escape(part));
        pattern.push_str(".*");
    }
    // trailing ".*" from the loop always has one too many; drop it unless
    // the glob ends with a literal '*'.
    if !glob.ends_with('*') {
        pattern.truncate(pattern.len() - 2);
    }
    pattern.push('$');
    Regex::new(&pattern).expect("glob_to_regex always builds a valid pattern")
}

/// A `user_glob/name_glob` pattern (spec §6 "`*` is a glob over users
/// and/or queues for list operations"). A pattern with no `/` is treated
/// as `default_user/pattern`, consistent with bare-name addressing.
pub struct QueueGlob {
    user: Regex,
    name: Regex,
}

impl QueueGlob {
    pub fn parse(raw: &str, default_user: &str) -> Self {
        let (user_glob, name_glob) = match raw.split_once('/') {
            Some((u, n)) => (u.to_string(), n.to_string()),
            None => (default_user.to_string(), raw.to_string()),
        };
        QueueGlob {
            user: glob_to_regex(&user_glob),
            name: glob_to_regex(&name_glob),
        }
    }

    pub fn matches(&self, user: &str, name: &str) -> bool {
        self.user.is_match(user) && self.name.is_match(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_defaults_user() {
        let addr = QueueAddress::parse("jobs", "alice");
        assert_eq!(addr, QueueAddress { user: "alice".to_string(), name: "jobs".to_string() });
    }

    #[test]
    fn explicit_user_prefix_is_honored() {
        let addr = QueueAddress::parse("bob/jobs", "alice");
        assert_eq!(addr, QueueAddress { user: "bob".to_string(), name: "jobs".to_string() });
    }

    #[test]
    fn glob_star_matches_everything_in_its_segment() {
        let glob = QueueGlob::parse("*/*", "alice");
        assert!(glob.matches("bob", "jobs"));
        assert!(glob.matches("alice", "anything"));
    }

    #[test]
    fn glob_prefix_restricts_matches() {
        let glob = QueueGlob::parse("alice/job*", "alice");
        assert!(glob.matches("alice", "jobs"));
        assert!(!glob.matches("alice", "other"));
        assert!(!glob.matches("bob", "jobs"));
    }
}
