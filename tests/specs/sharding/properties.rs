// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quantified invariants over the recorded assignment, plus boundary
//! cases.

use crate::prelude::*;

/// Full coverage and pairwise disjointness for a non-local job.
fn assert_covered(job: &str, cells: &JobAssignment, total: u32) {
    check_disjoint(&JobName::new(job), cells).unwrap();
    assert!(covers_fully(cells, total), "union must be 0..{total}; {cells:?}");
}

#[tokio::test]
async fn full_coverage_and_disjointness_across_jobs() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    for exe in ["a", "b", "c"] {
        cluster.register_executor(exe).await;
    }
    cluster.configure_job(
        "j1",
        &[("enabled", "true"), ("shardingTotalCount", "7"), ("loadLevel", "1")],
    )
    .await;
    cluster.configure_job(
        "j2",
        &[("enabled", "true"), ("shardingTotalCount", "3"), ("loadLevel", "2")],
    )
    .await;

    assert!(cluster.wait_assigned("j1", 7).await, "j1 never fully covered");
    assert!(cluster.wait_assigned("j2", 3).await, "j2 never fully covered");

    assert_covered("j1", &cluster.assignment_of("j1").await, 7);
    assert_covered("j2", &cluster.assignment_of("j2").await, 3);
    cluster.stop().await;
}

#[tokio::test]
async fn load_spread_is_bounded_by_the_max_level() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.configure_job(
        "light",
        &[("enabled", "true"), ("shardingTotalCount", "4"), ("loadLevel", "1")],
    )
    .await;
    cluster.configure_job(
        "heavy",
        &[("enabled", "true"), ("shardingTotalCount", "3"), ("loadLevel", "2")],
    )
    .await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;

    assert!(cluster.wait_assigned("light", 4).await);
    assert!(cluster.wait_assigned("heavy", 3).await);

    let light = cluster.assignment_of("light").await;
    let heavy = cluster.assignment_of("heavy").await;
    let load = |exe: &str| -> u64 {
        light.get(exe).map(|s| s.len() as u64).unwrap_or(0)
            + 2 * heavy.get(exe).map(|s| s.len() as u64).unwrap_or(0)
    };
    let loads = [load("a"), load("b")];
    let spread = loads.iter().max().unwrap() - loads.iter().min().unwrap();
    assert!(spread <= 2, "spread {spread} exceeds the max load level; {light:?} {heavy:?}");
    cluster.stop().await;
}

#[tokio::test]
async fn identical_inputs_produce_no_further_writes() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.register_executor("b").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "a", "0,2").await;
    cluster.wait_shards("j", "b", "1,3").await;
    let count = cluster.sharding_count().await;
    let before = cluster.assignment_of("j").await;

    cluster.trigger("-noop-1", "first replay").await;
    cluster.trigger("-noop-2", "second replay").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(cluster.assignment_of("j").await, before);
    assert_eq!(cluster.sharding_count().await, count, "empty turns must not write");
    cluster.stop().await;
}

#[tokio::test]
async fn zero_shard_count_job_stays_inert() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.configure_job("j", &[("enabled", "true"), ("shardingTotalCount", "0")]).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cluster.assignment_of("j").await.is_empty());
    assert_eq!(cluster.sharding_count().await, 0);
    assert!(cluster.alarms.alarms().is_empty());
    cluster.stop().await;
}

#[tokio::test]
async fn all_executors_offline_clears_alarms_and_keeps_leading() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "a", "0,1,2,3").await;

    cluster.set_offline("a").await;

    cluster.wait_shards("j", "a", "").await;
    assert!(cluster.wait_alarm(AlarmKind::NoEligibleExecutor).await);
    assert_eq!(cluster.leader().await.as_deref(), Some("host-1"));
    cluster.stop().await;
}

#[tokio::test]
async fn ghost_prefer_list_degrades_to_everyone() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.configure_job(
        "j",
        &[
            ("enabled", "true"),
            ("shardingTotalCount", "2"),
            ("preferList", "never-came-online"),
        ],
    )
    .await;

    cluster.wait_shards("j", "a", "0,1").await;
    cluster.stop().await;
}

#[tokio::test]
async fn disabled_job_is_cleared_silently() {
    let cluster = Cluster::start().await;
    cluster.wait_leader(Some("host-1")).await;
    cluster.register_executor("a").await;
    cluster.configure_job("j", BASIC_JOB).await;
    cluster.wait_shards("j", "a", "0,1,2,3").await;

    cluster.configure_job("j", &[("enabled", "false")]).await;
    cluster.trigger("-disable", "operator disabled j").await;

    cluster.wait_shards("j", "a", "").await;
    assert_eq!(cluster.alarms.count_of(AlarmKind::NoEligibleExecutor), 0);
    cluster.stop().await;
}
