// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded single-consumer event queue between the intake and the
//! engine.
//!
//! Producers never block: on overflow the sender sets a shared resync
//! flag, and the receiver supersedes the drained backlog with a single
//! `Resync`. The receiver also collapses duplicate events per drain, so
//! identical events arriving within one engine turn cost one turn.

use shardman_core::ShardingEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Create a bounded queue; the receiver side belongs to the engine.
pub fn event_queue(capacity: usize) -> (IntakeSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let resync = Arc::new(AtomicBool::new(false));
    (
        IntakeSender { tx, resync: Arc::clone(&resync) },
        EventReceiver { rx, resync },
    )
}

/// Producer handle used by intake listeners; cheap to clone.
#[derive(Clone)]
pub struct IntakeSender {
    tx: mpsc::Sender<ShardingEvent>,
    resync: Arc<AtomicBool>,
}

impl IntakeSender {
    /// Enqueue without blocking; degrade to a resync on overflow.
    pub fn push(&self, event: ShardingEvent) {
        if let Err(err) = self.tx.try_send(event) {
            tracing::warn!(error = %err, "event queue full, degrading to resync");
            self.resync.store(true, Ordering::SeqCst);
        }
    }
}

/// Single consumer side owned by the engine loop.
pub struct EventReceiver {
    rx: mpsc::Receiver<ShardingEvent>,
    resync: Arc<AtomicBool>,
}

impl EventReceiver {
    /// Await the next batch of events.
    ///
    /// Drains everything immediately available, collapses duplicates,
    /// and — when an overflow happened — supersedes the backlog with
    /// one `Resync` (leader changes are kept, they gate engine state).
    /// Returns `None` when all senders are gone.
    pub async fn next_batch(&mut self) -> Option<Vec<ShardingEvent>> {
        let first = self.rx.recv().await?;
        let mut batch = vec![first];
        while let Ok(event) = self.rx.try_recv() {
            batch.push(event);
        }

        if self.resync.swap(false, Ordering::SeqCst) {
            let mut kept: Vec<ShardingEvent> = batch
                .into_iter()
                .filter(|e| matches!(e, ShardingEvent::LeaderChanged { .. }))
                .collect();
            kept.push(ShardingEvent::Resync);
            return Some(kept);
        }

        let mut seen: Vec<ShardingEvent> = Vec::with_capacity(batch.len());
        for event in batch {
            if !seen.contains(&event) {
                seen.push(event);
            }
        }
        Some(seen)
    }

    /// Drop everything currently queued (leader-version demotion).
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.resync.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
