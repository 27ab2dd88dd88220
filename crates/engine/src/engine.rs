// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-writer engine loop.
//!
//! One cooperative worker drains the event queue; each event drives a
//! sharding turn of snapshot → compute → transactional commit. Turns
//! are strictly serial. Nothing inside a turn is ever process-fatal:
//! errors degrade to resyncs, demotions, or per-job alarms.

use crate::alarm::{Alarm, AlarmKind, AlarmSink};
use crate::assign::plan_job;
use crate::commit::{build_commit, CommitPlan};
use crate::eligibility::eligible_executors;
use crate::queue::{EventReceiver, IntakeSender};
use crate::views::Snapshot;
use shardman_core::{
    check_disjoint, Assignment, ExecutorId, JobAssignment, JobName, NodePaths, ShardingEvent,
    LOCAL_SHARD,
};
use shardman_store::{CoordClient, CoordError, RetryPolicy};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Host id written into the leader lock.
    pub host_id: String,
    /// Backoff for transient store errors during snapshots.
    pub retry: RetryPolicy,
}

/// Engine lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    /// Idle except for leader-change events.
    Following,
    /// Holder of the leader lock; the only state that takes turns.
    Leading,
    /// Winding down; outstanding work is cancelled.
    Draining,
}

shardman_core::simple_display! {
    EngineState {
        Uninitialized => "uninitialized",
        Following => "following",
        Leading => "leading",
        Draining => "draining",
    }
}

/// The sharding decision core for one namespace.
pub struct ShardingEngine<C: CoordClient> {
    client: Arc<C>,
    paths: NodePaths,
    config: EngineConfig,
    alarm: Arc<dyn AlarmSink>,
    queue: EventReceiver,
    /// Used to re-enqueue resyncs from inside a failed turn.
    self_sender: IntakeSender,
    cancel: CancellationToken,
    state: EngineState,
    state_tx: watch::Sender<EngineState>,
}

impl<C: CoordClient> ShardingEngine<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<C>,
        paths: NodePaths,
        config: EngineConfig,
        alarm: Arc<dyn AlarmSink>,
        queue: EventReceiver,
        self_sender: IntakeSender,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, _) = watch::channel(EngineState::Uninitialized);
        Self {
            client,
            paths,
            config,
            alarm,
            queue,
            self_sender,
            cancel,
            state: EngineState::Uninitialized,
            state_tx,
        }
    }

    /// Observe state transitions (election outcome, demotions).
    pub fn state_watch(&self) -> watch::Receiver<EngineState> {
        self.state_tx.subscribe()
    }

    /// Run until cancelled. Election first; then the turn loop.
    pub async fn run(mut self) {
        if self.try_elect().await {
            self.enter(EngineState::Leading);
            self.self_sender.push(ShardingEvent::Resync);
        } else {
            self.enter(EngineState::Following);
        }

        let cancel = self.cancel.clone();
        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => break,
                batch = self.queue.next_batch() => batch,
            };
            let Some(events) = batch else { break };
            for event in events {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.handle(event).await;
            }
        }

        self.shutdown().await;
    }

    fn enter(&mut self, state: EngineState) {
        if self.state != state {
            tracing::info!(from = %self.state, to = %state, "engine state change");
        }
        self.state = state;
        let _ = self.state_tx.send(state);
    }

    async fn try_elect(&self) -> bool {
        let path = self.paths.leader_host();
        match self.client.create_ephemeral(&path, self.config.host_id.as_bytes()).await {
            Ok(()) => {
                tracing::info!(host = %self.config.host_id, "leadership acquired");
                true
            }
            Err(CoordError::NodeExists(_)) => {
                tracing::debug!(host = %self.config.host_id, "leader lock taken, following");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "leader election failed, following until the next change");
                false
            }
        }
    }

    async fn handle(&mut self, event: ShardingEvent) {
        match (self.state, &event) {
            (EngineState::Leading, ShardingEvent::LeaderChanged { holder }) => {
                if holder.as_deref() == Some(self.config.host_id.as_str()) {
                    return; // our own lock appearing
                }
                tracing::warn!(holder = ?holder, "leader lock changed under us");
                self.queue.clear();
                if self.try_elect().await {
                    self.enter(EngineState::Leading);
                    self.self_sender.push(ShardingEvent::Resync);
                } else {
                    self.enter(EngineState::Following);
                }
            }
            (EngineState::Leading, _) => self.take_turn(&event).await,
            (EngineState::Following, ShardingEvent::LeaderChanged { holder: None }) => {
                if self.try_elect().await {
                    self.enter(EngineState::Leading);
                    self.self_sender.push(ShardingEvent::Resync);
                }
            }
            // Followers are idle; draining drops everything.
            _ => {}
        }
    }

    /// One sharding turn: snapshot → classify → plan → commit.
    async fn take_turn(&mut self, event: &ShardingEvent) {
        let snapshot =
            match Snapshot::load(&self.client, &self.paths, self.config.retry).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(event = %event, error = %err, "snapshot failed, resyncing");
                    self.self_sender.push(ShardingEvent::Resync);
                    return;
                }
            };

        if snapshot.leader_value.as_deref() != Some(self.config.host_id.as_str()) {
            tracing::warn!(
                holder = ?snapshot.leader_value,
                "leader lock is not ours, demoting"
            );
            self.queue.clear();
            self.enter(EngineState::Following);
            return;
        }
        let leader_version = snapshot.leader_version.unwrap_or(0);

        for (job, err) in &snapshot.skipped {
            self.raise(job.clone(), AlarmKind::InvalidConfig, err.to_string());
        }

        let affected: BTreeSet<JobName> = if event.affects_all_jobs() {
            snapshot.jobs.keys().cloned().collect()
        } else {
            event
                .entity()
                .map(JobName::new)
                .filter(|job| snapshot.jobs.contains_key(job))
                .into_iter()
                .collect()
        };

        let Some(next) = self.compute(event, &snapshot, &affected) else {
            return; // invariant violation; turn aborted
        };

        let delta = snapshot.assignment.delta(&next);
        if delta.is_empty() {
            tracing::debug!(event = %event, "turn produced no changes");
            return;
        }

        let reason = match event {
            ShardingEvent::ShardingTrigger { reason } => reason.clone(),
            other => other.to_string(),
        };
        let marker_id = nanoid::nanoid!(10);
        let ops = build_commit(
            &self.paths,
            &CommitPlan {
                leader_version,
                delta: &delta,
                reason: &reason,
                marker_id: &marker_id,
                next_count: snapshot.sharding_count + 1,
            },
        );

        match self.client.multi(ops).await {
            Ok(()) => {
                tracing::info!(event = %event, cells = delta.len(), "sharding turn committed");
            }
            Err(CoordError::BadVersion { .. }) => {
                tracing::warn!(event = %event, "leadership changed mid-turn, demoting");
                self.queue.clear();
                self.enter(EngineState::Following);
            }
            Err(err) => {
                tracing::warn!(event = %event, error = %err, "commit failed, resyncing");
                self.self_sender.push(ShardingEvent::Resync);
            }
        }
    }

    /// Build the target assignment for the turn.
    ///
    /// Unaffected jobs carry their recorded assignment through and
    /// contribute to the load tally before affected jobs are planned.
    fn compute(
        &self,
        event: &ShardingEvent,
        snapshot: &Snapshot,
        affected: &BTreeSet<JobName>,
    ) -> Option<Assignment> {
        let mut next = Assignment::new();
        let mut loads: BTreeMap<ExecutorId, u64> = BTreeMap::new();

        for (job, per_exe) in snapshot.assignment.jobs() {
            if affected.contains(job) {
                continue;
            }
            let level =
                snapshot.jobs.get(job).map(|v| v.load_level.max(1)).unwrap_or(1) as u64;
            for (exe, shards) in per_exe {
                let count = shards.iter().filter(|&&s| s != LOCAL_SHARD).count() as u64;
                *loads.entry(exe.clone()).or_default() += level * count;
            }
            next.set_job(job.clone(), per_exe.clone());
        }

        let release = event.releases_frozen();
        let empty = JobAssignment::new();
        for job in affected {
            let Some(view) = snapshot.jobs.get(job) else { continue };
            let eligible = eligible_executors(view, &snapshot.executors);
            let current = snapshot.assignment.job(job).unwrap_or(&empty);
            let plan = plan_job(view, current, &eligible, &mut loads, release);

            if plan.no_eligible {
                self.raise(
                    job.clone(),
                    AlarmKind::NoEligibleExecutor,
                    "enabled job has no eligible executor".to_string(),
                );
            }
            if !plan.frozen.is_empty() {
                let holders: Vec<&str> =
                    plan.frozen.iter().map(|e| e.as_str()).collect();
                self.raise(
                    job.clone(),
                    AlarmKind::FrozenShards,
                    format!("shards stay recorded against offline {}", holders.join(",")),
                );
            }
            if let Err(violation) = check_disjoint(job, &plan.target) {
                tracing::error!(
                    job = %job,
                    error = %violation,
                    target = ?plan.target,
                    executors = ?snapshot.executors,
                    "assignment invariant violated, aborting turn"
                );
                self.raise(job.clone(), AlarmKind::AssignmentInvariant, violation.to_string());
                return None;
            }
            next.set_job(job.clone(), plan.target);
        }
        Some(next)
    }

    async fn shutdown(&mut self) {
        let was_leading = self.state == EngineState::Leading;
        self.enter(EngineState::Draining);
        self.queue.clear();
        if was_leading {
            let path = self.paths.leader_host();
            if let Ok(Some((value, _))) = self.client.get(&path).await {
                if value == self.config.host_id.as_bytes() {
                    match self.client.delete_recursive(&path).await {
                        Ok(()) => tracing::info!("leader lock released"),
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to release leader lock")
                        }
                    }
                }
            }
        }
        self.enter(EngineState::Uninitialized);
    }

    fn raise(&self, job: JobName, kind: AlarmKind, detail: String) {
        self.alarm.raise(Alarm {
            namespace: self.paths.namespace().clone(),
            job,
            kind,
            detail,
        });
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
