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

//! Cycle detection and the WAITING -> PENDING cascade (spec §4.2/§4.3).
//!
//! Dependency edges never leave the store: cascading is driven entirely by
//! `requires` rows and the `state` column, so it composes with crash
//! recovery for free.

use std::collections::{HashMap, HashSet};

use diesel::prelude::*;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use uuid::Uuid;

use crate::database::schema::requires;
use crate::error::QueueError;
use crate::models::row::RequireRow;
use crate::task::TaskState;

/// Builds a dependency graph (dependency -> dependent) over `new_ids` plus
/// their `edges` (dependent -> requires) and rejects it if introducing
/// `edges` would create a cycle. Mirrors the teacher's `Workflow::has_cycles`
/// but takes the edge list directly rather than owning a persistent graph,
/// since edges here already live in the `requires` table.
pub fn reject_cycles(edges: &[(Uuid, Uuid)]) -> Result<(), QueueError> {
    let mut graph = DiGraph::<Uuid, ()>::new();
    let mut index_of = HashMap::new();

    let mut node = |graph: &mut DiGraph<Uuid, ()>, index_of: &mut HashMap<Uuid, _>, id: Uuid| {
        *index_of.entry(id).or_insert_with(|| graph.add_node(id))
    };

    for &(dependent, dependency) in edges {
        let from = node(&mut graph, &mut index_of, dependency);
        let to = node(&mut graph, &mut index_of, dependent);
        graph.add_edge(from, to, ());
    }

    if is_cyclic_directed(&graph) {
        let involved = edges
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(QueueError::CyclicDependency(involved));
    }

    Ok(())
}

/// Given the ids whose state just became terminal, finds WAITING tasks
/// that depend on them and returns the subset now ready to promote to
/// PENDING: every one of their `requires` rows must point at a task whose
/// current state is terminal (spec §4.3 cascade rule).
///
/// `conn` must already be inside the caller's write transaction.
pub fn ready_after_terminal(
    conn: &mut SqliteConnection,
    newly_terminal: &[Uuid],
) -> Result<Vec<Uuid>, QueueError> {
    use crate::database::schema::tasks;

    if newly_terminal.is_empty() {
        return Ok(Vec::new());
    }

    let terminal_strs: Vec<String> = newly_terminal.iter().map(Uuid::to_string).collect();

    // Candidate dependents: anything requiring one of the newly-terminal ids.
    let candidate_ids: Vec<String> = requires::table
        .filter(requires::require.eq_any(&terminal_strs))
        .select(requires::id)
        .distinct()
        .load(conn)?;

    if candidate_ids.is_empty() {
        return Ok(Vec::new());
    }

    let waiting_candidates: Vec<String> = tasks::table
        .filter(tasks::id.eq_any(&candidate_ids))
        .filter(tasks::state.eq(TaskState::Waiting.to_string()))
        .select(tasks::id)
        .load(conn)?;

    if waiting_candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut ready = Vec::new();
    for id in waiting_candidates {
        let require_rows: Vec<RequireRow> = requires::table
            .filter(requires::id.eq(&id))
            .load(conn)?;
        let require_ids: Vec<String> = require_rows.into_iter().map(|r| r.require).collect();

        let terminal_count: i64 = tasks::table
            .filter(tasks::id.eq_any(&require_ids))
            .filter(tasks::state.eq_any(TaskState::ALL.iter().filter(|s| s.is_terminal()).map(|s| s.to_string()).collect::<Vec<_>>()))
            .count()
            .get_result(conn)?;

        if terminal_count as usize == require_ids.len() {
            ready.push(Uuid::parse_str(&id).map_err(|e| QueueError::StoreCorrupt(e.to_string()))?);
        }
    }

    Ok(ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_acyclic_edges() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert!(reject_cycles(&[(a, b), (b, c)]).is_ok());
    }

    #[test]
    fn rejects_cyclic_edges() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert!(reject_cycles(&[(a, b), (b, c), (c, a)]).is_err());
    }
}
