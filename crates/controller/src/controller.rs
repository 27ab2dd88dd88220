// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespace lifecycle: wire the caches, the intake, and the engine;
//! supervise the store session; tear everything down in reverse.

use crate::clean::ExecutorCleanService;
use crate::intake::{
    ConnectionListener, ExecutorListener, JobListener, LeaderListener, ShardingTriggerListener,
    EXECUTORS_DEPTH, JOBS_DEPTH, LEADER_DEPTH, SHARDING_DEPTH,
};
use parking_lot::Mutex;
use shardman_cache::TreeCacheManager;
use shardman_core::{Namespace, NodePaths};
use shardman_engine::{
    event_queue, AlarmSink, EngineConfig, EngineState, LogAlarmSink, ShardingEngine,
};
use shardman_store::{with_retry, ConnectionState, CoordClient, CoordError, RetryPolicy};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller already started")]
    AlreadyStarted,
    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// Controller tunables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub namespace: Namespace,
    /// Host id this process writes into the leader lock.
    pub host_id: String,
    /// Bound of the intake → engine event queue.
    pub queue_capacity: usize,
    /// Backoff for transient store errors.
    pub retry: RetryPolicy,
}

impl ControllerConfig {
    pub fn new(namespace: impl Into<Namespace>, host_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            host_id: host_id.into(),
            queue_capacity: 256,
            retry: RetryPolicy::default(),
        }
    }

    shardman_core::setters! {
        set {
            queue_capacity: usize,
            retry: RetryPolicy,
        }
    }
}

/// The running cache + engine chain; rebuilt after every reconnect.
struct Chain<C: CoordClient> {
    cache: Arc<TreeCacheManager<C>>,
    cancel: CancellationToken,
    engine_task: JoinHandle<()>,
    state: watch::Receiver<EngineState>,
}

/// Lifecycle owner of one namespace's sharding coordinator.
pub struct NamespaceController<C: CoordClient> {
    client: Arc<C>,
    config: ControllerConfig,
    paths: NodePaths,
    alarm: Arc<dyn AlarmSink>,
    chain: Mutex<Option<Chain<C>>>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl<C: CoordClient> NamespaceController<C> {
    pub fn new(client: Arc<C>, config: ControllerConfig) -> Arc<Self> {
        Self::with_alarm(client, config, Arc::new(LogAlarmSink))
    }

    pub fn with_alarm(
        client: Arc<C>,
        config: ControllerConfig,
        alarm: Arc<dyn AlarmSink>,
    ) -> Arc<Self> {
        let paths = NodePaths::new(config.namespace.clone());
        Arc::new(Self {
            client,
            config,
            paths,
            alarm,
            chain: Mutex::new(None),
            supervisor: Mutex::new(None),
        })
    }

    /// Start the namespace: caches, engine election, intake listeners,
    /// and the session supervisor.
    pub async fn start(self: &Arc<Self>) -> Result<(), ControllerError> {
        if self.supervisor.lock().is_some() || self.chain.lock().is_some() {
            return Err(ControllerError::AlreadyStarted);
        }
        self.start_chain().await?;
        self.spawn_supervisor();
        tracing::info!(namespace = %self.config.namespace, host = %self.config.host_id, "namespace controller started");
        Ok(())
    }

    /// Stop everything in reverse start order.
    pub async fn stop(self: &Arc<Self>) {
        if let Some(task) = self.supervisor.lock().take() {
            task.abort();
        }
        self.stop_chain().await;
        tracing::info!(namespace = %self.config.namespace, "namespace controller stopped");
    }

    /// Engine state feed of the current chain, when one is running.
    pub fn engine_state(&self) -> Option<watch::Receiver<EngineState>> {
        self.chain.lock().as_ref().map(|c| c.state.clone())
    }

    pub fn is_running(&self) -> bool {
        self.chain.lock().is_some()
    }

    async fn start_chain(self: &Arc<Self>) -> Result<(), ControllerError> {
        // Roots must exist before the caches walk them.
        for root in self.paths.watched_roots() {
            with_retry(self.config.retry, || self.client.ensure_persistent(&root)).await?;
        }

        let cache = Arc::new(TreeCacheManager::new(Arc::clone(&self.client)));
        cache.start();

        let (tx, rx) = event_queue(self.config.queue_capacity);
        let cancel = CancellationToken::new();
        let engine = ShardingEngine::new(
            Arc::clone(&self.client),
            self.paths.clone(),
            EngineConfig { host_id: self.config.host_id.clone(), retry: self.config.retry },
            Arc::clone(&self.alarm),
            rx,
            tx.clone(),
            cancel.clone(),
        );
        let state = engine.state_watch();
        let engine_task = tokio::spawn(engine.run());

        let clean =
            Arc::new(ExecutorCleanService::new(Arc::clone(&self.client), self.paths.clone()));
        cache.add_listener(
            &self.paths.jobs_root(),
            JOBS_DEPTH,
            Arc::new(JobListener::new(self.paths.clone(), tx.clone())),
        );
        cache.add_listener(
            &self.paths.executors_root(),
            EXECUTORS_DEPTH,
            Arc::new(ExecutorListener::new(self.paths.clone(), tx.clone(), clean)),
        );
        cache.add_listener(
            &self.paths.sharding_root(),
            SHARDING_DEPTH,
            Arc::new(ShardingTriggerListener::new(self.paths.clone(), tx.clone())),
        );
        cache.add_listener(
            &self.paths.leader_root(),
            LEADER_DEPTH,
            Arc::new(LeaderListener::new(self.paths.clone(), tx.clone())),
        );
        // Connection transitions fan out to every cache; one listener
        // is enough to turn a reconnect into a resync.
        cache.add_listener(
            &self.paths.jobs_root(),
            JOBS_DEPTH,
            Arc::new(ConnectionListener::new(tx.clone())),
        );

        *self.chain.lock() = Some(Chain { cache, cancel, engine_task, state });
        Ok(())
    }

    async fn stop_chain(&self) {
        let chain = self.chain.lock().take();
        let Some(chain) = chain else { return };
        chain.cache.shutdown().await;
        chain.cancel.cancel();
        let _ = chain.engine_task.await;
        tracing::debug!(namespace = %self.config.namespace, "chain stopped");
    }

    /// React to session transitions: suspension and loss tear the chain
    /// down; a reconnect re-runs the full start sequence from scratch.
    fn spawn_supervisor(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        let mut rx = self.client.connection_events();
        *self.supervisor.lock() = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ConnectionState::Suspended) | Ok(ConnectionState::Lost) => {
                        tracing::warn!(
                            namespace = %controller.config.namespace,
                            "session degraded, stopping chain"
                        );
                        controller.stop_chain().await;
                    }
                    Ok(ConnectionState::Reconnected) => {
                        tracing::info!(
                            namespace = %controller.config.namespace,
                            "session restored, restarting chain"
                        );
                        controller.stop_chain().await;
                        if let Err(err) = controller.start_chain().await {
                            tracing::error!(
                                namespace = %controller.config.namespace,
                                error = %err,
                                "chain restart failed"
                            );
                        }
                    }
                    Ok(ConnectionState::Connected) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "connection feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
