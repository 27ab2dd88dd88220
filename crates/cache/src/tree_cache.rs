// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-`(root, depth)` subtree caches.
//!
//! Each cache runs one worker task: an initial snapshot walk of the
//! subtree, then the tail of the store's node-event feed filtered to
//! the subtree. Events within one cache are delivered in store order;
//! no order is promised across caches. Listeners run serially on the
//! cache task and must only enqueue — long work belongs on the event
//! queue behind them.

use parking_lot::Mutex;
use shardman_store::{
    ConnectionState, CoordClient, NodeEvent, NodeEventKind, Stat,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Change events delivered to cache listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    NodeAdded { path: String, data: Vec<u8>, stat: Stat },
    NodeUpdated { path: String, data: Vec<u8>, stat: Stat },
    NodeRemoved { path: String, data: Vec<u8>, stat: Stat },
    /// The initial snapshot has been fully delivered.
    Initialized,
    ConnectionSuspended,
    ConnectionReconnected,
    ConnectionLost,
}

/// A subscriber for one cache's events.
///
/// Implementations must not block the cache task beyond enqueuing.
pub trait CacheListener: Send + Sync + 'static {
    fn on_event(&self, event: &CacheEvent);
}

type Listeners = Arc<Mutex<Vec<Arc<dyn CacheListener>>>>;

struct CacheEntry {
    root: String,
    depth: usize,
    listeners: Listeners,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Owner of all subtree caches for one namespace session.
pub struct TreeCacheManager<C: CoordClient> {
    client: Arc<C>,
    caches: Mutex<Vec<CacheEntry>>,
    conn_task: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl<C: CoordClient> TreeCacheManager<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            caches: Mutex::new(Vec::new()),
            conn_task: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Start the connection fan-out: every cache's listeners see
    /// suspension, reconnection, and loss transitions.
    pub fn start(self: &Arc<Self>) {
        let mut guard = self.conn_task.lock();
        if guard.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        let mut rx = self.client.connection_events();
        let cancel = self.cancel.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                let state = tokio::select! {
                    _ = cancel.cancelled() => break,
                    state = rx.recv() => state,
                };
                let event = match state {
                    Ok(ConnectionState::Suspended) => CacheEvent::ConnectionSuspended,
                    Ok(ConnectionState::Reconnected) | Ok(ConnectionState::Connected) => {
                        CacheEvent::ConnectionReconnected
                    }
                    Ok(ConnectionState::Lost) => CacheEvent::ConnectionLost,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "connection event feed lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                for listeners in manager.all_listeners() {
                    deliver(&listeners, &event);
                }
            }
        }));
    }

    fn all_listeners(&self) -> Vec<Listeners> {
        self.caches.lock().iter().map(|c| Arc::clone(&c.listeners)).collect()
    }

    /// Materialize the subtree below `root` to `depth` levels.
    ///
    /// Idempotent per `(root, depth)`: a second call is a no-op.
    pub fn add_cache(&self, root: &str, depth: usize) {
        let mut caches = self.caches.lock();
        if caches.iter().any(|c| c.root == root && c.depth == depth) {
            return;
        }
        let listeners: Listeners = Arc::new(Mutex::new(Vec::new()));
        let cancel = self.cancel.child_token();
        // Subscribe before the snapshot so no change can fall between.
        let events = self.client.node_events();
        let task = tokio::spawn(run_cache(
            Arc::clone(&self.client),
            root.to_string(),
            depth,
            events,
            Arc::clone(&listeners),
            cancel.clone(),
        ));
        caches.push(CacheEntry {
            root: root.to_string(),
            depth,
            listeners,
            cancel,
            task: Some(task),
        });
    }

    /// Attach a listener to the `(root, depth)` cache, creating the
    /// cache if needed. Listeners attached after creation do not see a
    /// replay of earlier events.
    pub fn add_listener(&self, root: &str, depth: usize, listener: Arc<dyn CacheListener>) {
        self.add_cache(root, depth);
        let caches = self.caches.lock();
        if let Some(entry) =
            caches.iter().find(|c| c.root == root && c.depth == depth)
        {
            entry.listeners.lock().push(listener);
        }
    }

    /// Release caches and listeners in reverse creation order.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let conn_task = self.conn_task.lock().take();
        if let Some(task) = conn_task {
            let _ = task.await;
        }
        let mut entries: Vec<CacheEntry> = {
            let mut caches = self.caches.lock();
            caches.drain(..).collect()
        };
        while let Some(mut entry) = entries.pop() {
            entry.cancel.cancel();
            if let Some(task) = entry.task.take() {
                let _ = task.await;
            }
            entry.listeners.lock().clear();
            tracing::debug!(root = %entry.root, depth = entry.depth, "cache released");
        }
    }
}

fn deliver(listeners: &Listeners, event: &CacheEvent) {
    for listener in listeners.lock().iter() {
        listener.on_event(event);
    }
}

/// Whether `path` is a strict descendant of `root` within `depth` levels.
fn in_scope(root: &str, depth: usize, path: &str) -> bool {
    match path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => {
            let levels = rest.split('/').skip(1).count();
            levels >= 1 && levels <= depth
        }
        _ => false,
    }
}

async fn snapshot<C: CoordClient>(
    client: &Arc<C>,
    root: &str,
    depth: usize,
) -> shardman_store::CoordResult<Vec<(String, Vec<u8>, Stat)>> {
    let mut out = Vec::new();
    let mut frontier = vec![(root.to_string(), 0usize)];
    while let Some((path, level)) = frontier.pop() {
        if level >= depth {
            continue;
        }
        for child in client.children(&path).await? {
            let child_path = format!("{path}/{child}");
            if let Some((data, stat)) = client.get(&child_path).await? {
                out.push((child_path.clone(), data, stat));
            }
            frontier.push((child_path, level + 1));
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

async fn run_cache<C: CoordClient>(
    client: Arc<C>,
    root: String,
    depth: usize,
    mut events: broadcast::Receiver<NodeEvent>,
    listeners: Listeners,
    cancel: CancellationToken,
) {
    let mut known: BTreeSet<String> = BTreeSet::new();

    match snapshot(&client, &root, depth).await {
        Ok(nodes) => {
            for (path, data, stat) in nodes {
                known.insert(path.clone());
                deliver(&listeners, &CacheEvent::NodeAdded { path, data, stat });
            }
        }
        Err(err) => {
            tracing::error!(root = %root, error = %err, "cache snapshot failed");
        }
    }
    deliver(&listeners, &CacheEvent::Initialized);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(root = %root, missed, "node event feed lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };
        if !in_scope(&root, depth, &event.path) {
            continue;
        }
        let NodeEvent { kind, path, value, stat } = event;
        // The snapshot and the tail overlap; the known-set keeps the
        // added/updated distinction consistent for listeners.
        let cache_event = match kind {
            NodeEventKind::Created | NodeEventKind::Updated => {
                if known.insert(path.clone()) {
                    CacheEvent::NodeAdded { path, data: value, stat }
                } else {
                    CacheEvent::NodeUpdated { path, data: value, stat }
                }
            }
            NodeEventKind::Deleted => {
                if !known.remove(&path) {
                    continue;
                }
                CacheEvent::NodeRemoved { path, data: value, stat }
            }
        };
        deliver(&listeners, &cache_event);
    }
}

#[cfg(test)]
#[path = "tree_cache_tests.rs"]
mod tests;
