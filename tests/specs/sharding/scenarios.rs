// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The literal end-to-end sharding scenarios.

use crate::prelude::*;

#[tokio::test]
async fn cold_start_one_job() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;

    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job("j", BASIC_JOB).await;

    cluster.wait_shards("j", "a", "0,2").await;
    cluster.wait_shards("j", "b", "1,3").await;
    cluster.stop().await;
}

#[tokio::test]
async fn executor_offline_with_failover() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "b", "1,3").await;
    let count = cluster.sharding_count().await;

    cluster.set_offline("b").await;

    cluster.wait_shards("j", "a", "0,1,2,3").await;
    cluster.wait_shards("j", "b", "").await;
    assert!(cluster.sharding_count().await > count, "count must move on a real commit");
    cluster.stop().await;
}

#[tokio::test]
async fn executor_offline_without_failover() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job(
        "j",
        &[
            ("enabled", "true"),
            ("shardingTotalCount", "4"),
            ("loadLevel", "1"),
            ("failover", "false"),
        ],
    )
    .await;
    cluster.wait_shards("j", "b", "1,3").await;
    let count = cluster.sharding_count().await;

    cluster.set_offline("b").await;

    assert!(cluster.wait_alarm(AlarmKind::FrozenShards).await, "freeze must be alarmed");
    assert_eq!(cluster.shards_of("j", "a").await.as_deref(), Some("0,2"));
    assert_eq!(cluster.shards_of("j", "b").await.as_deref(), Some("1,3"));
    assert_eq!(cluster.sharding_count().await, count, "no commit for a frozen turn");
    cluster.stop().await;
}

#[tokio::test]
async fn frozen_holdings_release_on_explicit_trigger() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job(
        "j",
        &[
            ("enabled", "true"),
            ("shardingTotalCount", "4"),
            ("failover", "false"),
        ],
    )
    .await;
    cluster.wait_shards("j", "b", "1,3").await;
    cluster.set_offline("b").await;
    assert!(cluster.wait_alarm(AlarmKind::FrozenShards).await);

    cluster.trigger("-ops", "release after incident").await;

    cluster.wait_shards("j", "a", "0,1,2,3").await;
    cluster.wait_shards("j", "b", "").await;
    cluster.stop().await;
}

#[tokio::test]
async fn local_mode_job() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    for exe in ["a", "b", "c"] {
        cluster.register_executor(exe).await;
    }
    cluster.configure_job(
        "j",
        &[("enabled", "true"), ("localMode", "true"), ("shardingTotalCount", "1")],
    )
    .await;

    for exe in ["a", "b", "c"] {
        cluster.wait_shards("j", exe, "-1").await;
    }
    cluster.stop().await;
}

#[tokio::test]
async fn prefer_list_exclusive() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job(
        "j",
        &[
            ("enabled", "true"),
            ("shardingTotalCount", "4"),
            ("preferList", "b"),
            ("useDispreferList", "false"),
        ],
    )
    .await;

    cluster.wait_shards("j", "b", "0,1,2,3").await;
    assert_eq!(cluster.shards_of("j", "a").await, None);
    cluster.stop().await;
}

#[tokio::test]
async fn reconnect_after_session_loss_reproduces_assignment() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "a", "0,2").await;
    cluster.wait_shards("j", "b", "1,3").await;
    let before = cluster.assignment_of("j").await;

    cluster.store.expire_session();
    assert!(cluster.wait_stopped().await, "session loss must tear the chain down");
    assert_eq!(cluster.leader().await, None);

    // Executors re-register under the new session before the
    // coordinator's chain comes back, so the first post-reconnect turn
    // sees unchanged inputs.
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.store.reconnect();

    cluster.wait_leader(Some("host-1")).await;
    cluster.wait_shards("j", "a", "0,2").await;
    cluster.wait_shards("j", "b", "1,3").await;
    assert_eq!(cluster.assignment_of("j").await, before);
    cluster.stop().await;
}
