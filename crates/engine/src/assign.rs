// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The assignment planner: minimise shard movement subject to load
//! balance.
//!
//! Planning is pure: it maps the current per-job assignment, the
//! eligible executor set, and the running load tally to a target
//! assignment. Shards held by still-eligible executors stay put;
//! unassigned shards go to executors in ascending load order; a final
//! rebalance narrows the load spread to the job's load level.

use shardman_core::{ExecutorId, JobAssignment, JobView, ShardId, LOCAL_SHARD};
use std::collections::{BTreeMap, BTreeSet};

/// Planner output for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPlan {
    /// Target assignment; executors absent here but present in the
    /// current assignment get cleared by the commit delta.
    pub target: JobAssignment,
    /// Enabled job that no executor can serve this turn.
    pub no_eligible: bool,
    /// Offline holders whose shards stay recorded (`failover=false`).
    pub frozen: Vec<ExecutorId>,
}

/// Plan one job's target assignment.
///
/// `loads` is the namespace-wide executor load tally; retained and
/// newly placed shards are added to it as the plan builds, so jobs
/// planned later in the turn see earlier placements.
///
/// `release_frozen` is set for explicit sharding triggers only: it
/// returns shards recorded against offline no-failover holders to the
/// pool.
pub fn plan_job(
    view: &JobView,
    current: &JobAssignment,
    eligible: &BTreeSet<ExecutorId>,
    loads: &mut BTreeMap<ExecutorId, u64>,
    release_frozen: bool,
) -> JobPlan {
    // A job with zero shards never produces writes.
    if view.sharding_total_count == 0 {
        return JobPlan { target: current.clone(), no_eligible: false, frozen: Vec::new() };
    }

    if view.local_mode {
        return plan_local(view, current, eligible, release_frozen);
    }

    let level = view.load_level.max(1) as u64;
    let all: BTreeSet<ShardId> = (0..view.sharding_total_count as ShardId).collect();
    let mut target = JobAssignment::new();
    let mut frozen = Vec::new();

    // Retention: shards stay with still-eligible holders; no-failover
    // holdings on departed executors stay recorded untouched.
    for (exe, shards) in current {
        if eligible.contains(exe) {
            let kept: BTreeSet<ShardId> =
                shards.intersection(&all).copied().collect();
            *loads.entry(exe.clone()).or_default() += level * kept.len() as u64;
            target.insert(exe.clone(), kept);
        } else if view.enabled && !view.failover && !release_frozen && !shards.is_empty() {
            frozen.push(exe.clone());
            target.insert(exe.clone(), shards.clone());
        }
        // Everything else is dropped; the commit delta clears the node.
    }
    for exe in eligible {
        target.entry(exe.clone()).or_default();
    }

    let held: BTreeSet<ShardId> = target.values().flatten().copied().collect();
    let unassigned: Vec<ShardId> = all.difference(&held).copied().collect();

    if eligible.is_empty() {
        return JobPlan { target, no_eligible: view.enabled, frozen };
    }

    // Greedy placement in ascending load order, ties broken by id.
    for shard in unassigned {
        if let Some(exe) = least_loaded(eligible, loads) {
            if let Some(shards) = target.get_mut(&exe) {
                shards.insert(shard);
            }
            *loads.entry(exe).or_default() += level;
        }
    }

    rebalance(view, &mut target, eligible, loads);

    JobPlan { target, no_eligible: false, frozen }
}

fn plan_local(
    view: &JobView,
    current: &JobAssignment,
    eligible: &BTreeSet<ExecutorId>,
    release_frozen: bool,
) -> JobPlan {
    let mut target = JobAssignment::new();
    let mut frozen = Vec::new();
    for (exe, shards) in current {
        if !eligible.contains(exe)
            && view.enabled
            && !view.failover
            && !release_frozen
            && !shards.is_empty()
        {
            frozen.push(exe.clone());
            target.insert(exe.clone(), shards.clone());
        }
    }
    for exe in eligible {
        target.insert(exe.clone(), BTreeSet::from([LOCAL_SHARD]));
    }
    JobPlan { target, no_eligible: view.enabled && eligible.is_empty(), frozen }
}

fn least_loaded(
    eligible: &BTreeSet<ExecutorId>,
    loads: &BTreeMap<ExecutorId, u64>,
) -> Option<ExecutorId> {
    eligible
        .iter()
        .min_by_key(|exe| (loads.get(exe.as_str()).copied().unwrap_or(0), (*exe).clone()))
        .cloned()
}

fn most_loaded_with_shards(
    eligible: &BTreeSet<ExecutorId>,
    loads: &BTreeMap<ExecutorId, u64>,
    target: &JobAssignment,
) -> Option<(ExecutorId, u64)> {
    eligible
        .iter()
        .filter(|exe| target.get(exe.as_str()).is_some_and(|s| !s.is_empty()))
        .map(|exe| (exe.clone(), loads.get(exe.as_str()).copied().unwrap_or(0)))
        .max_by_key(|(exe, load)| (*load, exe.clone()))
}

/// Move single shards from the most-loaded to the least-loaded eligible
/// executor while the spread exceeds the job's load level and each move
/// strictly narrows it.
///
/// This is what re-covers a freshly returned executor without a full
/// recomputation: retention alone would leave it empty forever.
fn rebalance(
    view: &JobView,
    target: &mut JobAssignment,
    eligible: &BTreeSet<ExecutorId>,
    loads: &mut BTreeMap<ExecutorId, u64>,
) {
    if eligible.len() < 2 {
        return;
    }
    let level = view.load_level.max(1) as u64;
    // Each move strictly decreases the sum of squared loads, so this
    // terminates; the cap is a guard against surprises.
    for _ in 0..view.sharding_total_count {
        let Some((donor, donor_load)) = most_loaded_with_shards(eligible, loads, target)
        else {
            break;
        };
        let Some(receiver) = least_loaded(eligible, loads) else { break };
        let receiver_load = loads.get(receiver.as_str()).copied().unwrap_or(0);
        if donor == receiver || donor_load.saturating_sub(receiver_load) <= level {
            break;
        }
        let moved = target
            .get_mut(&donor)
            .and_then(|shards| shards.iter().next_back().copied().map(|s| {
                shards.remove(&s);
                s
            }));
        let Some(shard) = moved else { break };
        if let Some(shards) = target.get_mut(&receiver) {
            shards.insert(shard);
        }
        *loads.entry(donor.clone()).or_default() -= level;
        *loads.entry(receiver.clone()).or_default() += level;
    }
}

#[cfg(test)]
#[path = "assign_tests.rs"]
mod tests;
