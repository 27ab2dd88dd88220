// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shard assignment model and its CSV wire form.
//!
//! An assignment maps `job → executor → ordered shard set`. For each
//! non-local job the union of assigned shards equals
//! `{0..shardingTotalCount-1}` and every shard appears in at most one
//! executor; local-mode jobs assign the sentinel `-1` to every eligible
//! executor.

use crate::id::{ExecutorId, JobName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// A shard id in `[0, N)`, or [`LOCAL_SHARD`] for local-mode jobs.
pub type ShardId = i32;

/// The single logical shard of a local-mode job.
pub const LOCAL_SHARD: ShardId = -1;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("bad shard id {0:?} in CSV")]
pub struct ShardCsvError(pub String);

/// Encode a shard set as the store's CSV value (empty string for none).
pub fn encode_shards(shards: &BTreeSet<ShardId>) -> String {
    shards.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",")
}

/// Decode the store's CSV value into a shard set.
pub fn decode_shards(csv: &str) -> Result<BTreeSet<ShardId>, ShardCsvError> {
    let mut shards = BTreeSet::new();
    for part in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        shards.insert(part.parse().map_err(|_| ShardCsvError(part.to_string()))?);
    }
    Ok(shards)
}

/// Per-job assignment: executor → shard set.
pub type JobAssignment = BTreeMap<ExecutorId, BTreeSet<ShardId>>;

/// One changed `(job, executor)` cell of an assignment diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDelta {
    pub job: JobName,
    pub executor: ExecutorId,
    pub shards: BTreeSet<ShardId>,
}

/// The namespace-wide assignment owned by the sharding engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    jobs: BTreeMap<JobName, JobAssignment>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self, job: &JobName) -> Option<&JobAssignment> {
        self.jobs.get(job)
    }

    pub fn shards(&self, job: &JobName, exe: &ExecutorId) -> BTreeSet<ShardId> {
        self.jobs.get(job).and_then(|j| j.get(exe)).cloned().unwrap_or_default()
    }

    pub fn set_job(&mut self, job: JobName, assignment: JobAssignment) {
        self.jobs.insert(job, assignment);
    }

    pub fn remove_job(&mut self, job: &JobName) {
        self.jobs.remove(job);
    }

    pub fn jobs(&self) -> impl Iterator<Item = (&JobName, &JobAssignment)> {
        self.jobs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Total load of an executor: Σ over jobs of `loadLevel(J) × |shards|`.
    ///
    /// Local-mode sentinel shards carry no load.
    pub fn executor_load(
        &self,
        exe: &ExecutorId,
        load_level: impl Fn(&JobName) -> u32,
    ) -> u64 {
        self.jobs
            .iter()
            .map(|(job, per_exe)| {
                let count = per_exe
                    .get(exe)
                    .map(|s| s.iter().filter(|&&id| id != LOCAL_SHARD).count())
                    .unwrap_or(0);
                load_level(job) as u64 * count as u64
            })
            .sum()
    }

    /// Changed cells between `self` (current) and `next`.
    ///
    /// A cell present here but empty or absent in `next` yields an empty
    /// set, which serializes as the empty CSV.
    pub fn delta(&self, next: &Assignment) -> Vec<AssignmentDelta> {
        let mut changes = Vec::new();
        let empty = BTreeSet::new();
        let jobs: BTreeSet<&JobName> =
            self.jobs.keys().chain(next.jobs.keys()).collect();
        for job in jobs {
            let old = self.jobs.get(job);
            let new = next.jobs.get(job);
            let executors: BTreeSet<&ExecutorId> = old
                .map(|m| m.keys().collect::<BTreeSet<_>>())
                .unwrap_or_default()
                .into_iter()
                .chain(new.map(|m| m.keys().collect::<BTreeSet<_>>()).unwrap_or_default())
                .collect();
            for exe in executors {
                let before = old.and_then(|m| m.get(exe)).unwrap_or(&empty);
                let after = new.and_then(|m| m.get(exe)).unwrap_or(&empty);
                if before != after {
                    changes.push(AssignmentDelta {
                        job: job.clone(),
                        executor: exe.clone(),
                        shards: after.clone(),
                    });
                }
            }
        }
        changes
    }
}

/// Violation of the pairwise-disjointness invariant within one job.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("shard {shard} of job {job} assigned to both {first} and {second}")]
pub struct InvariantViolation {
    pub job: JobName,
    pub shard: ShardId,
    pub first: ExecutorId,
    pub second: ExecutorId,
}

/// Check that no shard appears under two executors of the same job.
pub fn check_disjoint(job: &JobName, assignment: &JobAssignment) -> Result<(), InvariantViolation> {
    let mut seen: BTreeMap<ShardId, &ExecutorId> = BTreeMap::new();
    for (exe, shards) in assignment {
        for &shard in shards {
            if shard == LOCAL_SHARD {
                continue;
            }
            if let Some(first) = seen.insert(shard, exe) {
                return Err(InvariantViolation {
                    job: job.clone(),
                    shard,
                    first: first.clone(),
                    second: exe.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Whether the union of assigned shards equals `{0..total-1}`.
pub fn covers_fully(assignment: &JobAssignment, total: u32) -> bool {
    let union: BTreeSet<ShardId> =
        assignment.values().flatten().copied().filter(|&s| s != LOCAL_SHARD).collect();
    let expected: BTreeSet<ShardId> = (0..total as ShardId).collect();
    union == expected
}

#[cfg(test)]
#[path = "assignment_tests.rs"]
mod tests;
