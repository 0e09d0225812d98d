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

//! Versioned binary encoding for the opaque `payload` columns.
//!
//! Per §9 design notes, payloads are encoded with an explicit version byte
//! followed by a `bincode`-serialized body, rather than relying on a
//! language-specific pickling format. Decoding an unrecognized version is a
//! hard error rather than a best-effort fallback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QueueError;
use crate::task::{Arg, Task, TaskState};

const PAYLOAD_VERSION: u8 = 1;

/// Everything about a [`Task`] that is not already denormalized into its
/// own `tasks` table columns (`id`, `state`, `manager_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskPayloadV1 {
    app_ref: String,
    args: Vec<Arg>,
    kwargs: BTreeMap<String, Arg>,
    job_id: Option<String>,
    errno: Option<i32>,
    stderr: String,
    stdout: String,
    result: Option<serde_json::Value>,
    dtime: Option<f64>,
}

/// Serializes a task's non-denormalized fields into a versioned byte blob.
pub fn encode_task(task: &Task) -> Result<Vec<u8>, QueueError> {
    let body = TaskPayloadV1 {
        app_ref: task.app_ref.clone(),
        args: task.args.clone(),
        kwargs: task.kwargs.clone(),
        job_id: task.job_id.clone(),
        errno: task.errno,
        stderr: task.stderr.clone(),
        stdout: task.stdout.clone(),
        result: task.result.clone(),
        dtime: task.dtime,
    };
    let mut out = vec![PAYLOAD_VERSION];
    bincode::serialize_into(&mut out, &body)
        .map_err(|e| QueueError::StoreCorrupt(format!("failed to encode task payload: {e}")))?;
    Ok(out)
}

/// Reassembles a [`Task`] from its denormalized columns plus a decoded
/// payload blob. Rejects any version byte other than the one this build
/// knows how to read.
pub fn decode_task(
    id: Uuid,
    state: TaskState,
    manager_id: Uuid,
    payload: &[u8],
) -> Result<Task, QueueError> {
    let (version, body) = payload
        .split_first()
        .ok_or_else(|| QueueError::StoreCorrupt("empty task payload".to_string()))?;
    if *version != PAYLOAD_VERSION {
        return Err(QueueError::StoreCorrupt(format!(
            "unsupported task payload version {version}"
        )));
    }
    let decoded: TaskPayloadV1 = bincode::deserialize(body)
        .map_err(|e| QueueError::StoreCorrupt(format!("failed to decode task payload: {e}")))?;

    Ok(Task {
        id,
        app_ref: decoded.app_ref,
        args: decoded.args,
        kwargs: decoded.kwargs,
        state,
        manager_id,
        job_id: decoded.job_id,
        errno: decoded.errno,
        stderr: decoded.stderr,
        stdout: decoded.stdout,
        result: decoded.result,
        dtime: decoded.dtime,
    })
}

/// Serializes manager configuration (environment, scheduler, provider) the
/// same way: a version byte plus a `bincode` body.
pub fn encode_manager(config: &impl Serialize) -> Result<Vec<u8>, QueueError> {
    let mut out = vec![PAYLOAD_VERSION];
    bincode::serialize_into(&mut out, config)
        .map_err(|e| QueueError::StoreCorrupt(format!("failed to encode manager payload: {e}")))?;
    Ok(out)
}

pub fn decode_manager<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> Result<T, QueueError> {
    let (version, body) = payload
        .split_first()
        .ok_or_else(|| QueueError::StoreCorrupt("empty manager payload".to_string()))?;
    if *version != PAYLOAD_VERSION {
        return Err(QueueError::StoreCorrupt(format!(
            "unsupported manager payload version {version}"
        )));
    }
    bincode::deserialize(body)
        .map_err(|e| QueueError::StoreCorrupt(format!("failed to decode manager payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_payload_round_trips() {
        let mut task = Task::new(
            "double",
            vec![Arg::Literal(serde_json::json!(21))],
            BTreeMap::new(),
            Uuid::nil(),
        );
        task.result = Some(serde_json::json!(42));
        task.stdout = "hi\n".to_string();

        let encoded = encode_task(&task).unwrap();
        let decoded = decode_task(task.id, TaskState::Succeeded, task.manager_id, &encoded).unwrap();

        assert_eq!(decoded.app_ref, "double");
        assert_eq!(decoded.result, Some(serde_json::json!(42)));
        assert_eq!(decoded.stdout, "hi\n");
        assert_eq!(decoded.state, TaskState::Succeeded);
    }

    #[test]
    fn rejects_unknown_version() {
        let bad = vec![9u8, 1, 2, 3];
        let err = decode_task(Uuid::nil(), TaskState::Pending, Uuid::nil(), &bad).unwrap_err();
        assert!(matches!(err, QueueError::StoreCorrupt(_)));
    }
}
