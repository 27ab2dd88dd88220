// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed sharding events consumed by the engine.
//!
//! The event intake translates raw tree-cache events into this union;
//! the engine is the single consumer. Serializes with
//! `{"type": "event:name", ...fields}` format.

use crate::id::{ExecutorId, JobName};
use serde::{Deserialize, Serialize};

/// Events that drive sharding turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShardingEvent {
    #[serde(rename = "executor:online")]
    ExecutorOnline { executor: ExecutorId },

    #[serde(rename = "executor:offline")]
    ExecutorOffline { executor: ExecutorId },

    #[serde(rename = "job:added")]
    JobAdded { job: JobName },

    #[serde(rename = "job:removed")]
    JobRemoved { job: JobName },

    /// Manual or system-initiated resharding trigger.
    #[serde(rename = "sharding:trigger")]
    ShardingTrigger { reason: String },

    /// The `/leader/host` node changed; `None` means the lock is vacant.
    #[serde(rename = "leader:changed")]
    LeaderChanged { holder: Option<String> },

    /// Forces a full recomputation; supersedes any queued backlog.
    #[serde(rename = "resync")]
    Resync,
}

impl ShardingEvent {
    /// Entity key for per-entity ordering and coalescing, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            ShardingEvent::ExecutorOnline { executor }
            | ShardingEvent::ExecutorOffline { executor } => Some(executor.as_str()),
            ShardingEvent::JobAdded { job } | ShardingEvent::JobRemoved { job } => {
                Some(job.as_str())
            }
            ShardingEvent::ShardingTrigger { .. }
            | ShardingEvent::LeaderChanged { .. }
            | ShardingEvent::Resync => None,
        }
    }

    /// Whether a turn for this event must recompute every job in the
    /// namespace, rather than just one.
    pub fn affects_all_jobs(&self) -> bool {
        !matches!(
            self,
            ShardingEvent::JobAdded { .. } | ShardingEvent::JobRemoved { .. }
        )
    }

    /// An explicit trigger releases frozen no-failover holdings; nothing
    /// else does.
    pub fn releases_frozen(&self) -> bool {
        matches!(self, ShardingEvent::ShardingTrigger { .. })
    }
}

crate::simple_display! {
    ShardingEvent {
        ExecutorOnline { .. } => "executor:online",
        ExecutorOffline { .. } => "executor:offline",
        JobAdded { .. } => "job:added",
        JobRemoved { .. } => "job:removed",
        ShardingTrigger { .. } => "sharding:trigger",
        LeaderChanged { .. } => "leader:changed",
        Resync => "resync",
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
