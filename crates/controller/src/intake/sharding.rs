// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/sharding` depth-1 subscriber: operator-initiated resharding
//! triggers.
//!
//! Only `trigger*` nodes count; the engine's own `marker-*` nodes and
//! the `count` counter never feed back into the queue.

use shardman_cache::{CacheEvent, CacheListener};
use shardman_core::{NodePaths, ShardingEvent};
use shardman_engine::IntakeSender;

pub struct ShardingTriggerListener {
    paths: NodePaths,
    tx: IntakeSender,
}

impl ShardingTriggerListener {
    pub fn new(paths: NodePaths, tx: IntakeSender) -> Self {
        Self { paths, tx }
    }

    fn push_trigger(&self, path: &str, data: &[u8]) {
        let Some(node) = self.paths.trigger_of_path(path) else {
            return;
        };
        let payload = String::from_utf8_lossy(data);
        let reason =
            if payload.trim().is_empty() { node } else { payload.into_owned() };
        self.tx.push(ShardingEvent::ShardingTrigger { reason });
    }
}

impl CacheListener for ShardingTriggerListener {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::NodeAdded { path, data, .. }
            | CacheEvent::NodeUpdated { path, data, .. } => self.push_trigger(path, data),
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "sharding_tests.rs"]
mod tests;
