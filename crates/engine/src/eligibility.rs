// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job executor eligibility.

use crate::views::ExecutorView;
use shardman_core::{ExecutorId, JobView};
use std::collections::{BTreeMap, BTreeSet};

/// Executors eligible to hold shards of the job.
///
/// Rules:
/// - only online executors, and only for enabled jobs;
/// - with a non-empty prefer list, an executor qualifies by being named
///   in it, or — when `useDispreferList` is set — by being any online
///   executor (container resources included);
/// - a prefer list naming only executors that never registered is
///   treated as empty;
/// - with an empty prefer list, every online non-container executor
///   qualifies.
pub fn eligible_executors(
    view: &JobView,
    executors: &BTreeMap<ExecutorId, ExecutorView>,
) -> BTreeSet<ExecutorId> {
    if !view.enabled {
        return BTreeSet::new();
    }

    let known_preferred: BTreeSet<&ExecutorId> =
        view.prefer_list.iter().filter(|e| executors.contains_key(e.as_str())).collect();

    executors
        .iter()
        .filter(|(_, info)| info.online)
        .filter(|(exe, info)| {
            if known_preferred.is_empty() {
                !info.container
            } else {
                known_preferred.contains(exe) || view.use_disprefer_list
            }
        })
        .map(|(exe, _)| exe.clone())
        .collect()
}

#[cfg(test)]
#[path = "eligibility_tests.rs"]
mod tests;
