// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use shardman_core::{ExecutorId, JobName};

#[test]
fn batch_shape_check_cells_marker_count() {
    let paths = NodePaths::new("ns");
    let delta = vec![
        AssignmentDelta {
            job: JobName::new("j"),
            executor: ExecutorId::new("a"),
            shards: [0, 1].into_iter().collect(),
        },
        AssignmentDelta {
            job: JobName::new("j"),
            executor: ExecutorId::new("b"),
            shards: Default::default(),
        },
    ];
    let ops = build_commit(
        &paths,
        &CommitPlan {
            leader_version: 4,
            delta: &delta,
            reason: "executor:offline",
            marker_id: "m1",
            next_count: 8,
        },
    );

    assert_eq!(ops.len(), 5);
    assert_eq!(
        ops[0],
        TxOp::Check { path: "/ns/leader/host".into(), version: 4 }
    );
    assert_eq!(
        ops[1],
        TxOp::Set { path: "/ns/jobs/j/servers/a/sharding".into(), value: b"0,1".to_vec() }
    );
    // Cleared cells write the empty CSV, not a delete.
    assert_eq!(
        ops[2],
        TxOp::Set { path: "/ns/jobs/j/servers/b/sharding".into(), value: Vec::new() }
    );
    assert_eq!(
        ops[3],
        TxOp::Create {
            path: "/ns/sharding/marker-m1".into(),
            value: b"executor:offline".to_vec()
        }
    );
    assert_eq!(
        ops[4],
        TxOp::Set { path: "/ns/sharding/count".into(), value: b"8".to_vec() }
    );
}
