// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/leader` depth-1 subscriber: leadership watchdog.
//!
//! The ephemeral leader node is the only synchronization primitive;
//! watching it is what lets followers contend when it vanishes.

use shardman_cache::{CacheEvent, CacheListener};
use shardman_core::{NodePaths, ShardingEvent};
use shardman_engine::IntakeSender;

pub struct LeaderListener {
    paths: NodePaths,
    tx: IntakeSender,
}

impl LeaderListener {
    pub fn new(paths: NodePaths, tx: IntakeSender) -> Self {
        Self { paths, tx }
    }
}

impl CacheListener for LeaderListener {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::NodeAdded { path, data, .. }
            | CacheEvent::NodeUpdated { path, data, .. } => {
                if self.paths.is_leader_host(path) {
                    let holder = String::from_utf8_lossy(data).into_owned();
                    self.tx.push(ShardingEvent::LeaderChanged { holder: Some(holder) });
                }
            }
            CacheEvent::NodeRemoved { path, .. } => {
                if self.paths.is_leader_host(path) {
                    self.tx.push(ShardingEvent::LeaderChanged { holder: None });
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "leader_tests.rs"]
mod tests;
