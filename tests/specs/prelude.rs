// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the scenario specs.

pub use shardman_controller::{ControllerConfig, NamespaceController};
pub use shardman_core::{
    check_disjoint, covers_fully, ExecutorId, JobAssignment, JobName, NodePaths, ShardId,
};
pub use shardman_engine::{AlarmKind, RecordingAlarmSink};
pub use shardman_store::{CoordClient, MemoryStore};
pub use std::collections::{BTreeMap, BTreeSet};
pub use std::sync::Arc;
pub use std::time::Duration;

/// A namespace coordinator wired over one in-memory store.
pub struct Cluster {
    pub store: Arc<MemoryStore>,
    pub paths: NodePaths,
    pub controller: Arc<NamespaceController<MemoryStore>>,
    pub alarms: Arc<RecordingAlarmSink>,
}

impl Cluster {
    pub async fn start() -> Self {
        Self::start_host("host-1").await
    }

    pub async fn start_host(host: &str) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::join(store, host).await
    }

    /// Start another controller on an existing store (follower).
    pub async fn join(store: Arc<MemoryStore>, host: &str) -> Self {
        let paths = NodePaths::new("tenant-a");
        let alarms = RecordingAlarmSink::new();
        let controller = NamespaceController::with_alarm(
            Arc::clone(&store),
            ControllerConfig::new("tenant-a", host),
            alarms.clone(),
        );
        controller.start().await.unwrap();
        Self { store, paths, controller, alarms }
    }

    pub async fn stop(&self) {
        self.controller.stop().await;
    }

    pub async fn register_executor(&self, exe: &str) {
        let exe = ExecutorId::new(exe);
        self.store.set(&self.paths.executor(&exe), b"").await.unwrap();
        self.store
            .create_ephemeral(&self.paths.executor_ip(&exe), b"10.0.0.1")
            .await
            .unwrap();
    }

    /// Drop the liveness node: the executor-offline signal.
    pub async fn set_offline(&self, exe: &str) {
        let exe = ExecutorId::new(exe);
        self.store.delete_recursive(&self.paths.executor_ip(&exe)).await.unwrap();
    }

    pub async fn configure_job(&self, job: &str, keys: &[(&str, &str)]) {
        let job = JobName::new(job);
        for (key, value) in keys {
            self.store
                .set(&self.paths.job_config(&job, key), value.as_bytes())
                .await
                .unwrap();
        }
    }

    pub async fn trigger(&self, suffix: &str, reason: &str) {
        self.store
            .set(&self.paths.sharding_trigger(suffix), reason.as_bytes())
            .await
            .unwrap();
    }

    pub async fn shards_of(&self, job: &str, exe: &str) -> Option<String> {
        self.store
            .get(&self.paths.server_sharding(&JobName::new(job), &ExecutorId::new(exe)))
            .await
            .unwrap()
            .map(|(value, _)| String::from_utf8_lossy(&value).into_owned())
    }

    /// Full recorded assignment of one job, non-empty cells only.
    pub async fn assignment_of(&self, job: &str) -> JobAssignment {
        let job = JobName::new(job);
        let mut cells = JobAssignment::new();
        let servers = self
            .store
            .children(&self.paths.job_servers_root(&job))
            .await
            .unwrap();
        for server in servers {
            let exe = ExecutorId::new(&server);
            if let Some((value, _)) = self
                .store
                .get(&self.paths.server_sharding(&job, &exe))
                .await
                .unwrap()
            {
                let csv = String::from_utf8_lossy(&value);
                let shards = shardman_core::decode_shards(&csv).unwrap();
                if !shards.is_empty() {
                    cells.insert(exe, shards);
                }
            }
        }
        cells
    }

    pub async fn sharding_count(&self) -> u64 {
        self.store
            .get(&self.paths.sharding_count())
            .await
            .unwrap()
            .and_then(|(value, _)| String::from_utf8_lossy(&value).parse().ok())
            .unwrap_or(0)
    }

    pub async fn leader(&self) -> Option<String> {
        self.store
            .get(&self.paths.leader_host())
            .await
            .unwrap()
            .map(|(value, _)| String::from_utf8_lossy(&value).into_owned())
    }

    pub async fn wait_shards(&self, job: &str, exe: &str, expected: &str) {
        let reached = wait_until(|| async move {
            self.shards_of(job, exe).await.as_deref() == Some(expected)
        })
        .await;
        assert!(
            reached,
            "{job}/{exe} never reached {expected:?}, at {:?}",
            self.shards_of(job, exe).await
        );
    }

    pub async fn wait_leader(&self, expected: Option<&str>) {
        let reached =
            wait_until(|| async move { self.leader().await.as_deref() == expected }).await;
        assert!(reached, "leader never became {expected:?}, at {:?}", self.leader().await);
    }

    /// Wait for an alarm of the given kind.
    pub async fn wait_alarm(&self, kind: AlarmKind) -> bool {
        wait_until(|| async move { self.alarms.count_of(kind) > 0 }).await
    }

    /// Wait for the controller chain to stop.
    pub async fn wait_stopped(&self) -> bool {
        wait_until(|| async move { !self.controller.is_running() }).await
    }

    /// Wait for the controller chain to run.
    pub async fn wait_running(&self) -> bool {
        wait_until(|| async move { self.controller.is_running() }).await
    }

    /// Wait until the job's recorded shard cells sum to `total`.
    pub async fn wait_assigned(&self, job: &str, total: usize) -> bool {
        wait_until(|| async move {
            let cells = self.assignment_of(job).await;
            cells.values().map(|s| s.len()).sum::<usize>() == total
        })
        .await
    }
}

/// Poll `pred` until it holds or the spec budget runs out.
pub async fn wait_until<F, Fut>(pred: F) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..1500 {
        if pred().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}

/// Standard four-shard failover job.
pub const BASIC_JOB: &[(&str, &str)] = &[
    ("enabled", "true"),
    ("shardingTotalCount", "4"),
    ("loadLevel", "1"),
    ("failover", "true"),
];
