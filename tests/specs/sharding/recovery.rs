// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leadership handover and session degradation.

use crate::prelude::*;

#[tokio::test]
async fn follower_takes_over_when_the_leader_stops() {
    let leader = Cluster::start_host("host-1").await;
    leader.wait_leader(Some("host-1")).await;
    let follower = Cluster::join(Arc::clone(&leader.store), "host-2").await;

    leader.register_executor("a").await;
    leader.configure_job("j", BASIC_JOB).await;
    leader.wait_shards("j", "a", "0,1,2,3").await;

    // Orderly stop releases the lock; the follower's leader watch
    // fires and it wins the retry.
    leader.stop().await;
    follower.wait_leader(Some("host-2")).await;

    // The new leader keeps serving: an executor change still reshards.
    follower.register_executor("b").await;
    follower.wait_shards("j", "b", "2,3").await;
    follower.wait_shards("j", "a", "0,1").await;
    follower.stop().await;
}

#[tokio::test]
async fn suspension_stops_the_chain_until_reconnect() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "a", "0,1,2,3").await;

    cluster.store.suspend();
    assert!(cluster.wait_stopped().await, "suspension must stop the chain");

    cluster.store.reconnect();
    assert!(cluster.wait_running().await, "reconnect must restart the chain");
    cluster.wait_leader(Some("host-1")).await;
    assert_eq!(cluster.shards_of("j", "a").await.as_deref(), Some("0,1,2,3"));
    cluster.stop().await;
}

#[tokio::test]
async fn restart_after_stop_is_clean() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "a", "0,1,2,3").await;
    cluster.stop().await;
    assert_eq!(cluster.leader().await, None);

    cluster.controller.start().await.unwrap();
    cluster.wait_leader(Some("host-1")).await;
    assert_eq!(cluster.shards_of("j", "a").await.as_deref(), Some("0,1,2,3"));
    cluster.stop().await;
}
