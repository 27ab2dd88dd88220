// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shardman-engine: the leader-elected sharding decision core.
//!
//! A single-writer engine loop drains a bounded queue of sharding
//! events; each event drives one sharding turn of snapshot → compute →
//! transactional commit. Only the leader takes turns.

pub mod alarm;
pub mod assign;
pub mod commit;
pub mod eligibility;
pub mod engine;
pub mod queue;
pub mod views;

pub use alarm::{Alarm, AlarmKind, AlarmSink, LogAlarmSink};
pub use assign::{plan_job, JobPlan};
pub use eligibility::eligible_executors;
pub use engine::{EngineConfig, EngineState, ShardingEngine};
pub use queue::{event_queue, EventReceiver, IntakeSender};
pub use views::{ExecutorView, Snapshot};

#[cfg(any(test, feature = "test-support"))]
pub use alarm::RecordingAlarmSink;
