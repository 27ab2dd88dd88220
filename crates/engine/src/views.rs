// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working-copy snapshot of the store paths a sharding turn decides
//! with.

use shardman_core::{
    decode_shards, Assignment, ConfigError, ExecutorId, JobAssignment, JobConfig, JobName,
    JobView, NodePaths,
};
use shardman_store::{with_retry, CoordClient, CoordResult, RetryPolicy};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-executor facts the engine decides with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorView {
    /// The ephemeral `/ip` child exists.
    pub online: bool,
    /// Container resource: `@`-prefixed id or a `/task` child.
    pub container: bool,
    /// Executor software version, when published.
    pub version: Option<String>,
}

/// Snapshot of one turn's inputs.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub executors: BTreeMap<ExecutorId, ExecutorView>,
    pub jobs: BTreeMap<JobName, JobView>,
    /// Jobs whose config subtree failed to parse; skipped this turn.
    pub skipped: Vec<(JobName, ConfigError)>,
    /// Current assignment as recorded in the store.
    pub assignment: Assignment,
    /// Data version of `/leader/host`, `None` when the lock is vacant.
    pub leader_version: Option<i64>,
    /// Current leader lock value.
    pub leader_value: Option<String>,
    /// Advisory resharding counter.
    pub sharding_count: u64,
}

impl Snapshot {
    /// Read everything a turn needs through the client, with retries
    /// for transient errors.
    pub async fn load<C: CoordClient>(
        client: &Arc<C>,
        paths: &NodePaths,
        retry: RetryPolicy,
    ) -> CoordResult<Snapshot> {
        let mut snapshot = Snapshot::default();

        let leader_path = paths.leader_host();
        if let Some((value, stat)) =
            with_retry(retry, || client.get(&leader_path)).await?
        {
            snapshot.leader_version = Some(stat.version);
            snapshot.leader_value = Some(String::from_utf8_lossy(&value).into_owned());
        }

        let executors_root = paths.executors_root();
        for name in with_retry(retry, || client.children(&executors_root)).await? {
            let exe = ExecutorId::new(&name);
            let ip_path = paths.executor_ip(&exe);
            let task_path = paths.executor_task(&exe);
            let version_path = paths.executor_version(&exe);
            let online = with_retry(retry, || client.exists(&ip_path)).await?;
            let has_task = with_retry(retry, || client.exists(&task_path)).await?;
            let version = with_retry(retry, || client.get(&version_path))
                .await?
                .map(|(value, _)| String::from_utf8_lossy(&value).into_owned());
            let container = exe.is_container() || has_task;
            snapshot.executors.insert(exe, ExecutorView { online, container, version });
        }

        let jobs_root = paths.jobs_root();
        for name in with_retry(retry, || client.children(&jobs_root)).await? {
            let job = JobName::new(&name);
            let config_root = paths.job_config_root(&job);
            let mut keys = BTreeMap::new();
            for key in with_retry(retry, || client.children(&config_root)).await? {
                let key_path = paths.job_config(&job, &key);
                if let Some((value, _)) = with_retry(retry, || client.get(&key_path)).await? {
                    keys.insert(key, String::from_utf8_lossy(&value).into_owned());
                }
            }
            match JobConfig::from_store_keys(&keys) {
                Ok(config) => {
                    snapshot.jobs.insert(job.clone(), config.view());
                }
                Err(err) => {
                    snapshot.skipped.push((job.clone(), err));
                }
            }

            let servers_root = paths.job_servers_root(&job);
            let mut recorded = JobAssignment::new();
            for server in with_retry(retry, || client.children(&servers_root)).await? {
                let exe = ExecutorId::new(&server);
                let sharding_path = paths.server_sharding(&job, &exe);
                let Some((value, _)) =
                    with_retry(retry, || client.get(&sharding_path)).await?
                else {
                    continue;
                };
                let csv = String::from_utf8_lossy(&value);
                match decode_shards(&csv) {
                    Ok(shards) if !shards.is_empty() => {
                        recorded.insert(exe, shards);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(job = %job, executor = %exe, error = %err, "unreadable sharding CSV, treating as empty");
                    }
                }
            }
            if !recorded.is_empty() {
                snapshot.assignment.set_job(job, recorded);
            }
        }

        let count_path = paths.sharding_count();
        snapshot.sharding_count = with_retry(retry, || client.get(&count_path))
            .await?
            .and_then(|(value, _)| String::from_utf8_lossy(&value).trim().parse().ok())
            .unwrap_or(0);

        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "views_tests.rs"]
mod tests;
