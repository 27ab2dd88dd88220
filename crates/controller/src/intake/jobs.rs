// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/jobs` depth-1 subscriber: job added / removed.

use shardman_cache::{CacheEvent, CacheListener};
use shardman_core::{NodePaths, ShardingEvent};
use shardman_engine::IntakeSender;

pub struct JobListener {
    paths: NodePaths,
    tx: IntakeSender,
}

impl JobListener {
    pub fn new(paths: NodePaths, tx: IntakeSender) -> Self {
        Self { paths, tx }
    }
}

impl CacheListener for JobListener {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::NodeAdded { path, .. } => {
                if let Some(job) = self.paths.job_of_path(path) {
                    self.tx.push(ShardingEvent::JobAdded { job });
                }
            }
            CacheEvent::NodeRemoved { path, .. } => {
                if let Some(job) = self.paths.job_of_path(path) {
                    self.tx.push(ShardingEvent::JobRemoved { job });
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
