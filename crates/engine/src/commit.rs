// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turn commit protocol: one transactional batch per turn.
//!
//! The batch is prefixed with a version check of the leader lock so a
//! mid-turn leadership change aborts the whole write. Alongside the
//! changed assignment cells it publishes an observability marker and
//! bumps the advisory resharding counter.

use shardman_core::{encode_shards, AssignmentDelta, NodePaths};
use shardman_store::TxOp;

/// Inputs for one commit batch.
#[derive(Debug)]
pub struct CommitPlan<'a> {
    pub leader_version: i64,
    pub delta: &'a [AssignmentDelta],
    /// Human-readable cause recorded in the marker node.
    pub reason: &'a str,
    /// Unique suffix for the marker node name.
    pub marker_id: &'a str,
    /// `previous + 1`; advisory, written without a version check.
    pub next_count: u64,
}

/// Assemble the transactional batch for a turn.
pub fn build_commit(paths: &NodePaths, plan: &CommitPlan<'_>) -> Vec<TxOp> {
    let mut ops = Vec::with_capacity(plan.delta.len() + 3);
    ops.push(TxOp::Check { path: paths.leader_host(), version: plan.leader_version });
    for cell in plan.delta {
        ops.push(TxOp::Set {
            path: paths.server_sharding(&cell.job, &cell.executor),
            value: encode_shards(&cell.shards).into_bytes(),
        });
    }
    ops.push(TxOp::Create {
        path: paths.sharding_marker(plan.marker_id),
        value: plan.reason.as_bytes().to_vec(),
    });
    ops.push(TxOp::Set {
        path: paths.sharding_count(),
        value: plan.next_count.to_string().into_bytes(),
    });
    ops
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
