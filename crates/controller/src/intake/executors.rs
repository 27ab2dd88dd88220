// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/executors` depth-2 subscriber: `/ip` child transitions are the
//! executor liveness signal.

use crate::clean::ExecutorCleanService;
use shardman_cache::{CacheEvent, CacheListener};
use shardman_core::{NodePaths, ShardingEvent};
use shardman_engine::IntakeSender;
use shardman_store::CoordClient;
use std::sync::Arc;

pub struct ExecutorListener<C: CoordClient> {
    paths: NodePaths,
    tx: IntakeSender,
    clean: Arc<ExecutorCleanService<C>>,
}

impl<C: CoordClient> ExecutorListener<C> {
    pub fn new(paths: NodePaths, tx: IntakeSender, clean: Arc<ExecutorCleanService<C>>) -> Self {
        Self { paths, tx, clean }
    }
}

impl<C: CoordClient> CacheListener for ExecutorListener<C> {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::NodeAdded { path, .. } => {
                if let Some(executor) = self.paths.executor_of_ip_path(path) {
                    self.tx.push(ShardingEvent::ExecutorOnline { executor });
                }
            }
            CacheEvent::NodeRemoved { path, .. } => {
                if let Some(executor) = self.paths.executor_of_ip_path(path) {
                    // Clean the executor's runtime leftovers so the
                    // engine snapshots a clean slate.
                    self.clean.purge(&executor);
                    self.tx.push(ShardingEvent::ExecutorOffline { executor });
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "executors_tests.rs"]
mod tests;
