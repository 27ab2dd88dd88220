// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Purge of per-executor runtime state after an executor goes offline.
//!
//! Only runtime leftovers (the `status` node) are removed; the recorded
//! `sharding` value must survive an offline executor so that
//! no-failover holdings stay visible to the engine.

use shardman_core::{ExecutorId, NodePaths};
use shardman_store::CoordClient;
use std::sync::Arc;

pub struct ExecutorCleanService<C: CoordClient> {
    client: Arc<C>,
    paths: NodePaths,
}

impl<C: CoordClient> ExecutorCleanService<C> {
    pub fn new(client: Arc<C>, paths: NodePaths) -> Self {
        Self { client, paths }
    }

    /// Purge the executor's runtime nodes under every job, off the
    /// caller's thread.
    pub fn purge(&self, exe: &ExecutorId) {
        let client = Arc::clone(&self.client);
        let paths = self.paths.clone();
        let exe = exe.clone();
        tokio::spawn(async move {
            let jobs = match client.children(&paths.jobs_root()).await {
                Ok(jobs) => jobs,
                Err(err) => {
                    tracing::warn!(executor = %exe, error = %err, "clean service could not list jobs");
                    return;
                }
            };
            for job in jobs {
                let job = shardman_core::JobName::new(&job);
                let status = paths.server_status(&job, &exe);
                if let Err(err) = client.delete_recursive(&status).await {
                    tracing::warn!(
                        executor = %exe,
                        job = %job,
                        error = %err,
                        "clean service purge failed"
                    );
                }
            }
            tracing::debug!(executor = %exe, "runtime state purged");
        });
    }
}

#[cfg(test)]
#[path = "clean_tests.rs"]
mod tests;
