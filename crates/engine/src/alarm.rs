// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alarm collaborator seam.
//!
//! Alarms inform operators about jobs the engine could not serve; they
//! never abort the engine.

use shardman_core::{JobName, Namespace};

/// What went wrong for one job during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    /// An enabled job has no eligible executor; it stays unassigned
    /// until the next triggering event.
    NoEligibleExecutor,
    /// Malformed configuration; the job was skipped for this turn.
    InvalidConfig,
    /// A no-failover job holds shards recorded against an offline
    /// executor; only an explicit trigger releases them.
    FrozenShards,
    /// Internal invariant violation; the turn was aborted.
    AssignmentInvariant,
}

shardman_core::simple_display! {
    AlarmKind {
        NoEligibleExecutor => "no-eligible-executor",
        InvalidConfig => "invalid-config",
        FrozenShards => "frozen-shards",
        AssignmentInvariant => "assignment-invariant",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub namespace: Namespace,
    pub job: JobName,
    pub kind: AlarmKind,
    pub detail: String,
}

/// Sink for operator alarms.
pub trait AlarmSink: Send + Sync + 'static {
    fn raise(&self, alarm: Alarm);
}

/// Default sink: structured warning logs.
#[derive(Debug, Default, Clone)]
pub struct LogAlarmSink;

impl AlarmSink for LogAlarmSink {
    fn raise(&self, alarm: Alarm) {
        tracing::warn!(
            namespace = %alarm.namespace,
            job = %alarm.job,
            kind = %alarm.kind,
            detail = %alarm.detail,
            "sharding alarm"
        );
    }
}

/// Recording sink for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct RecordingAlarmSink {
    alarms: parking_lot::Mutex<Vec<Alarm>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingAlarmSink {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn alarms(&self) -> Vec<Alarm> {
        self.alarms.lock().clone()
    }

    pub fn count_of(&self, kind: AlarmKind) -> usize {
        self.alarms.lock().iter().filter(|a| a.kind == kind).count()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl AlarmSink for RecordingAlarmSink {
    fn raise(&self, alarm: Alarm) {
        self.alarms.lock().push(alarm);
    }
}
