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

//! Deterministic, content-derived identity for tasks and managers.
//!
//! Mirrors `hashlib.md5(pickle.dumps((app, args, kwargs))).hexdigest()`
//! from the original implementation, formatted directly as a UUID, but with
//! an explicit canonical encoding instead of `pickle` so the id is stable
//! across processes, hosts, and language runtimes.

use md5::{Digest, Md5};
use serde::Serialize;
use uuid::Uuid;

/// Serializes `value` to JSON and hashes the bytes with MD5, returning the
/// digest directly as a `Uuid`.
///
/// `serde_json`'s `Map` is a `BTreeMap` (the `preserve_order` feature is not
/// enabled anywhere in this crate), so object keys always serialize in
/// sorted order — canonicalization falls out of using `serde_json::Value`
/// as the intermediate representation rather than requiring a bespoke
/// canonicalizer.
fn md5_uuid_of(value: &impl Serialize) -> Uuid {
    let bytes = serde_json::to_vec(value).expect("in-memory value must serialize");
    let mut hasher = Md5::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    Uuid::from_bytes(digest.into())
}

/// Computes a task's id from its invocation triple. Deterministic across
/// processes and stable under reordering of kwargs (testable property 4).
pub fn compute_id(
    app_ref: &str,
    args: &[crate::task::Arg],
    kwargs: &std::collections::BTreeMap<String, crate::task::Arg>,
) -> Uuid {
    #[derive(Serialize)]
    struct Canonical<'a> {
        app: &'a str,
        args: &'a [crate::task::Arg],
        kwargs: &'a std::collections::BTreeMap<String, crate::task::Arg>,
    }

    md5_uuid_of(&Canonical {
        app: app_ref,
        args,
        kwargs,
    })
}

/// Computes a manager's id from its serialized configuration.
pub fn compute_manager_id(config: &impl Serialize) -> Uuid {
    md5_uuid_of(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Arg;
    use std::collections::BTreeMap;

    #[test]
    fn compute_id_is_deterministic() {
        let args = vec![Arg::Literal(serde_json::json!(1))];
        let kwargs = BTreeMap::new();
        let a = compute_id("double", &args, &kwargs);
        let b = compute_id("double", &args, &kwargs);
        assert_eq!(a, b);
    }

    #[test]
    fn compute_id_stable_under_kwargs_reordering() {
        let args = vec![];
        let mut kwargs_a = BTreeMap::new();
        kwargs_a.insert("x".to_string(), Arg::Literal(serde_json::json!(1)));
        kwargs_a.insert("y".to_string(), Arg::Literal(serde_json::json!(2)));

        let mut kwargs_b = BTreeMap::new();
        kwargs_b.insert("y".to_string(), Arg::Literal(serde_json::json!(2)));
        kwargs_b.insert("x".to_string(), Arg::Literal(serde_json::json!(1)));

        assert_eq!(
            compute_id("f", &args, &kwargs_a),
            compute_id("f", &args, &kwargs_b)
        );
    }

    #[test]
    fn compute_id_differs_for_different_args() {
        let kwargs = BTreeMap::new();
        let a = compute_id("f", &[Arg::Literal(serde_json::json!(1))], &kwargs);
        let b = compute_id("f", &[Arg::Literal(serde_json::json!(2))], &kwargs);
        assert_ne!(a, b);
    }
}
