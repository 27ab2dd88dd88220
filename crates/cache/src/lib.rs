// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shardman-cache: bounded-depth subtree caches over the coordination
//! store, delivering ordered change events to registered listeners.

mod tree_cache;

pub use tree_cache::{CacheEvent, CacheListener, TreeCacheManager};
