// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection-state subscriber: a reconnect after suspension forces a
//! full recomputation.

use shardman_cache::{CacheEvent, CacheListener};
use shardman_core::ShardingEvent;
use shardman_engine::IntakeSender;

pub struct ConnectionListener {
    tx: IntakeSender,
}

impl ConnectionListener {
    pub fn new(tx: IntakeSender) -> Self {
        Self { tx }
    }
}

impl CacheListener for ConnectionListener {
    fn on_event(&self, event: &CacheEvent) {
        if matches!(event, CacheEvent::ConnectionReconnected) {
            self.tx.push(ShardingEvent::Resync);
        }
    }
}
