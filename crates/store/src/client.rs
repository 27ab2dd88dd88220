// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination client trait consumed by the rest of the core.

use crate::error::CoordResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Node metadata as observed by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Data version, bumped on every set.
    pub version: i64,
    /// Child-list version, bumped on child create/delete.
    pub cversion: i64,
    /// Last modification time, epoch milliseconds.
    pub mtime_ms: u64,
}

/// One operation of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOp {
    /// Abort the batch unless the node's data version matches.
    Check { path: String, version: i64 },
    /// Create a persistent node; aborts if it already exists.
    Create { path: String, value: Vec<u8> },
    /// Upsert a persistent node's value.
    Set { path: String, value: Vec<u8> },
    /// Delete a node and its subtree; absent nodes are tolerated.
    Delete { path: String },
}

/// Connection-state transitions delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Suspended,
    /// Session gone; every ephemeral node (leader lock included) is
    /// forfeited.
    Lost,
    Reconnected,
}

shardman_core::simple_display! {
    ConnectionState {
        Connected => "connected",
        Suspended => "suspended",
        Lost => "lost",
        Reconnected => "reconnected",
    }
}

/// Kind of a node change in the store's event feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeEventKind {
    Created,
    Updated,
    Deleted,
}

/// A node change observed by the store, in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEvent {
    pub kind: NodeEventKind,
    pub path: String,
    /// Node data after the change (last known data for deletes).
    pub value: Vec<u8>,
    pub stat: Stat,
}

/// Thin adapter over the external hierarchical store.
///
/// Implementations translate these calls onto the store's client
/// library; the in-memory implementation backs tests. `set` upserts:
/// a missing node is created (with persistent parents) rather than
/// failing, which is what every caller in the coordinator wants.
#[async_trait]
pub trait CoordClient: Send + Sync + 'static {
    async fn exists(&self, path: &str) -> CoordResult<bool>;

    async fn get(&self, path: &str) -> CoordResult<Option<(Vec<u8>, Stat)>>;

    /// Names (not paths) of direct children, sorted.
    async fn children(&self, path: &str) -> CoordResult<Vec<String>>;

    /// Create a persistent node, creating missing persistent parents.
    async fn create_persistent(&self, path: &str, value: &[u8]) -> CoordResult<()>;

    /// Create a session-scoped ephemeral node.
    async fn create_ephemeral(&self, path: &str, value: &[u8]) -> CoordResult<()>;

    /// Create a session-scoped ephemeral node with a store-assigned
    /// monotonic suffix; returns the assigned path.
    async fn create_ephemeral_sequential(&self, path: &str, value: &[u8]) -> CoordResult<String>;

    /// Upsert a node's value; returns the resulting stat.
    async fn set(&self, path: &str, value: &[u8]) -> CoordResult<Stat>;

    /// Delete a node and everything below it; absent nodes are fine.
    async fn delete_recursive(&self, path: &str) -> CoordResult<()>;

    /// Commit a batch atomically; any failing op aborts the whole batch.
    async fn multi(&self, ops: Vec<TxOp>) -> CoordResult<()>;

    /// Store-ordered feed of node changes.
    fn node_events(&self) -> broadcast::Receiver<NodeEvent>;

    /// Session connection-state transitions.
    fn connection_events(&self) -> broadcast::Receiver<ConnectionState>;

    /// Create the node if absent, ignoring a concurrent creation.
    async fn ensure_persistent(&self, path: &str) -> CoordResult<()> {
        if self.exists(path).await? {
            return Ok(());
        }
        match self.create_persistent(path, b"").await {
            Err(crate::error::CoordError::NodeExists(_)) => Ok(()),
            other => other,
        }
    }
}
