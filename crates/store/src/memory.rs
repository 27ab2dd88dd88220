// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory coordination store with session semantics.
//!
//! Backs every test suite in the workspace: ephemeral ownership,
//! per-node versions, recursive delete, atomic batches with
//! check-and-set, a store-ordered node event feed, and test hooks for
//! session loss and suspension.

use crate::client::{ConnectionState, CoordClient, NodeEvent, NodeEventKind, Stat, TxOp};
use crate::env::SessionSettings;
use crate::error::{CoordError, CoordResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
struct Node {
    value: Vec<u8>,
    version: i64,
    cversion: i64,
    mtime_ms: u64,
    /// Owning session id for ephemerals, `None` for persistent nodes.
    session: Option<u64>,
    /// Monotonic counter for sequential children of this node.
    seq: u64,
}

impl Node {
    fn new(value: Vec<u8>, session: Option<u64>, mtime_ms: u64) -> Self {
        Self { value, version: 0, cversion: 0, mtime_ms, session, seq: 0 }
    }

    fn stat(&self) -> Stat {
        Stat { version: self.version, cversion: self.cversion, mtime_ms: self.mtime_ms }
    }
}

#[derive(Clone, Default)]
struct Tree {
    nodes: BTreeMap<String, Node>,
    session: u64,
    /// Logical clock driving `mtime_ms`.
    ticks: u64,
}

impl Tree {
    fn tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    fn ensure_parents(&mut self, path: &str, events: &mut Vec<NodeEvent>) -> CoordResult<()> {
        let mut prefix = String::new();
        let Some(ancestors) = path.rsplit_once('/').map(|(head, _)| head) else {
            return Ok(());
        };
        for segment in ancestors.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            if let Some(node) = self.nodes.get(&prefix) {
                if node.session.is_some() {
                    return Err(CoordError::Io(format!(
                        "ephemeral node {prefix} cannot have children"
                    )));
                }
                continue;
            }
            let mtime = self.tick();
            self.nodes.insert(prefix.clone(), Node::new(Vec::new(), None, mtime));
            events.push(NodeEvent {
                kind: NodeEventKind::Created,
                path: prefix.clone(),
                value: Vec::new(),
                stat: Stat { version: 0, cversion: 0, mtime_ms: mtime },
            });
        }
        Ok(())
    }

    fn bump_parent_cversion(&mut self, path: &str) {
        if let Some((parent, _)) = path.rsplit_once('/') {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.cversion += 1;
            }
        }
    }

    fn create(
        &mut self,
        path: &str,
        value: &[u8],
        session: Option<u64>,
        events: &mut Vec<NodeEvent>,
    ) -> CoordResult<Stat> {
        if self.nodes.contains_key(path) {
            return Err(CoordError::NodeExists(path.to_string()));
        }
        self.ensure_parents(path, events)?;
        let mtime = self.tick();
        let node = Node::new(value.to_vec(), session, mtime);
        let stat = node.stat();
        self.nodes.insert(path.to_string(), node);
        self.bump_parent_cversion(path);
        events.push(NodeEvent {
            kind: NodeEventKind::Created,
            path: path.to_string(),
            value: value.to_vec(),
            stat,
        });
        Ok(stat)
    }

    fn set(&mut self, path: &str, value: &[u8], events: &mut Vec<NodeEvent>) -> CoordResult<Stat> {
        if !self.nodes.contains_key(path) {
            return self.create(path, value, None, events);
        }
        let mtime = self.tick();
        // Checked above; the map cannot have lost the key under the lock.
        let Some(node) = self.nodes.get_mut(path) else {
            return Err(CoordError::NoNode(path.to_string()));
        };
        node.value = value.to_vec();
        node.version += 1;
        node.mtime_ms = mtime;
        let stat = node.stat();
        events.push(NodeEvent {
            kind: NodeEventKind::Updated,
            path: path.to_string(),
            value: value.to_vec(),
            stat,
        });
        Ok(stat)
    }

    fn delete_recursive(&mut self, path: &str, events: &mut Vec<NodeEvent>) {
        let prefix = format!("{path}/");
        let mut doomed: Vec<String> = self
            .nodes
            .keys()
            .filter(|p| p.as_str() == path || p.starts_with(&prefix))
            .cloned()
            .collect();
        // Children before parents, as the store would observe it.
        doomed.sort_by(|a, b| b.cmp(a));
        for victim in doomed {
            if let Some(node) = self.nodes.remove(&victim) {
                self.bump_parent_cversion(&victim);
                let stat = node.stat();
                events.push(NodeEvent {
                    kind: NodeEventKind::Deleted,
                    path: victim,
                    value: node.value,
                    stat,
                });
            }
        }
    }
}

/// In-memory [`CoordClient`] implementation.
pub struct MemoryStore {
    tree: Mutex<Tree>,
    node_tx: broadcast::Sender<NodeEvent>,
    conn_tx: broadcast::Sender<ConnectionState>,
    settings: SessionSettings,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_settings(SessionSettings::default())
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        let (node_tx, _) = broadcast::channel(1024);
        let (conn_tx, _) = broadcast::channel(64);
        Self { tree: Mutex::new(Tree::default()), node_tx, conn_tx, settings }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Current session id; bumps on [`expire_session`](Self::expire_session).
    pub fn session_id(&self) -> u64 {
        self.tree.lock().session
    }

    fn publish(&self, events: Vec<NodeEvent>) {
        for event in events {
            // Send fails only with no subscribers, which is fine.
            let _ = self.node_tx.send(event);
        }
    }

    // -- test hooks --

    /// Expire the current session: all ephemerals vanish and `Lost` is
    /// delivered to connection subscribers.
    pub fn expire_session(&self) {
        let mut events = Vec::new();
        {
            let mut tree = self.tree.lock();
            let old = tree.session;
            tree.session += 1;
            let doomed: Vec<String> = tree
                .nodes
                .iter()
                .filter(|(_, n)| n.session == Some(old))
                .map(|(p, _)| p.clone())
                .collect();
            for path in doomed {
                tree.delete_recursive(&path, &mut events);
            }
        }
        self.publish(events);
        let _ = self.conn_tx.send(ConnectionState::Lost);
    }

    /// Deliver `Suspended` to connection subscribers.
    pub fn suspend(&self) {
        let _ = self.conn_tx.send(ConnectionState::Suspended);
    }

    /// Deliver `Reconnected` to connection subscribers.
    pub fn reconnect(&self) {
        let _ = self.conn_tx.send(ConnectionState::Reconnected);
    }
}

#[async_trait]
impl CoordClient for MemoryStore {
    async fn exists(&self, path: &str) -> CoordResult<bool> {
        Ok(self.tree.lock().nodes.contains_key(path))
    }

    async fn get(&self, path: &str) -> CoordResult<Option<(Vec<u8>, Stat)>> {
        Ok(self.tree.lock().nodes.get(path).map(|n| (n.value.clone(), n.stat())))
    }

    async fn children(&self, path: &str) -> CoordResult<Vec<String>> {
        let prefix = format!("{path}/");
        let tree = self.tree.lock();
        Ok(tree
            .nodes
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    async fn create_persistent(&self, path: &str, value: &[u8]) -> CoordResult<()> {
        let mut events = Vec::new();
        let result = self.tree.lock().create(path, value, None, &mut events).map(|_| ());
        self.publish(events);
        result
    }

    async fn create_ephemeral(&self, path: &str, value: &[u8]) -> CoordResult<()> {
        let mut events = Vec::new();
        let result = {
            let mut tree = self.tree.lock();
            let session = tree.session;
            tree.create(path, value, Some(session), &mut events).map(|_| ())
        };
        self.publish(events);
        result
    }

    async fn create_ephemeral_sequential(&self, path: &str, value: &[u8]) -> CoordResult<String> {
        let mut events = Vec::new();
        let result = {
            let mut tree = self.tree.lock();
            let session = tree.session;
            match tree.ensure_parents(path, &mut events) {
                Ok(()) => {
                    let seq = match path.rsplit_once('/') {
                        Some((parent, _)) if !parent.is_empty() => {
                            match tree.nodes.get_mut(parent) {
                                Some(node) => {
                                    node.seq += 1;
                                    node.seq - 1
                                }
                                None => 0,
                            }
                        }
                        _ => 0,
                    };
                    let assigned = format!("{path}{seq:010}");
                    tree.create(&assigned, value, Some(session), &mut events)
                        .map(|_| assigned)
                }
                Err(err) => Err(err),
            }
        };
        self.publish(events);
        result
    }

    async fn set(&self, path: &str, value: &[u8]) -> CoordResult<Stat> {
        let mut events = Vec::new();
        let result = self.tree.lock().set(path, value, &mut events);
        self.publish(events);
        result
    }

    async fn delete_recursive(&self, path: &str) -> CoordResult<()> {
        let mut events = Vec::new();
        self.tree.lock().delete_recursive(path, &mut events);
        self.publish(events);
        Ok(())
    }

    async fn multi(&self, ops: Vec<TxOp>) -> CoordResult<()> {
        let mut events = Vec::new();
        let result = {
            let mut tree = self.tree.lock();
            // Stage on a copy so a failing op leaves nothing applied.
            let mut staged = tree.clone();
            let mut staged_events = Vec::new();
            let mut apply = || -> CoordResult<()> {
                for op in &ops {
                    match op {
                        TxOp::Check { path, version } => {
                            let node = staged
                                .nodes
                                .get(path)
                                .ok_or_else(|| CoordError::NoNode(path.clone()))?;
                            if node.version != *version {
                                return Err(CoordError::BadVersion {
                                    path: path.clone(),
                                    expected: *version,
                                    actual: node.version,
                                });
                            }
                        }
                        TxOp::Create { path, value } => {
                            staged.create(path, value, None, &mut staged_events)?;
                        }
                        TxOp::Set { path, value } => {
                            staged.set(path, value, &mut staged_events)?;
                        }
                        TxOp::Delete { path } => {
                            staged.delete_recursive(path, &mut staged_events);
                        }
                    }
                }
                Ok(())
            };
            match apply() {
                Ok(()) => {
                    *tree = staged;
                    events = staged_events;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        };
        self.publish(events);
        result
    }

    fn node_events(&self) -> broadcast::Receiver<NodeEvent> {
        self.node_tx.subscribe()
    }

    fn connection_events(&self) -> broadcast::Receiver<ConnectionState> {
        self.conn_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
