// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeMap;

fn keys(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn defaults_for_missing_keys() {
    let config = JobConfig::from_store_keys(&BTreeMap::new()).unwrap();
    assert!(!config.enabled);
    assert!(!config.local_mode);
    assert_eq!(config.sharding_total_count, 0);
    assert_eq!(config.load_level, 1);
    assert!(config.prefer_list.is_empty());
    assert!(config.failover);
    assert!(config.enabled_report);
    assert_eq!(config.time_zone, chrono_tz::UTC);
    assert_eq!(config.job_type, JobType::Java);
}

#[test]
fn full_key_set_parses() {
    let config = JobConfig::from_store_keys(&keys(&[
        ("enabled", "true"),
        ("localMode", "false"),
        ("shardingTotalCount", "8"),
        ("loadLevel", "3"),
        ("preferList", "exec-01, @pod-2"),
        ("useDispreferList", "true"),
        ("failover", "false"),
        ("jobType", "SHELL_JOB"),
        ("timeZone", "Asia/Shanghai"),
        ("pausePeriodDate", "12/25-1/5"),
        ("pausePeriodTime", "23:00-1:00"),
        ("timeout4AlarmSeconds", "300"),
        ("jobDegree", "2"),
        ("enabledReport", "false"),
        ("queueName", "payroll-q"),
        ("channelName", "payroll-ch"),
        ("customContext", r#"{"region":"eu-1"}"#),
        ("shardingItemParameters", "0=a,1=\"b,c\""),
    ]))
    .unwrap();

    assert!(config.enabled);
    assert_eq!(config.sharding_total_count, 8);
    assert_eq!(config.load_level, 3);
    assert_eq!(config.prefer_list, vec![ExecutorId::new("exec-01"), ExecutorId::new("@pod-2")]);
    assert!(config.use_disprefer_list);
    assert!(!config.failover);
    assert_eq!(config.job_type, JobType::Shell);
    assert_eq!(config.time_zone, chrono_tz::Asia::Shanghai);
    assert!(!config.pause_period.is_empty());
    assert_eq!(config.timeout_alarm_seconds, 300);
    assert_eq!(config.job_degree, 2);
    assert!(!config.enabled_report);
    assert_eq!(config.queue_name.as_deref(), Some("payroll-q"));
    assert_eq!(config.channel_name.as_deref(), Some("payroll-ch"));
    assert_eq!(config.custom_context.get("region").map(String::as_str), Some("eu-1"));
    assert_eq!(
        config.sharding_item_parameters.get(crate::sharding_params::ShardKey::Item(1)),
        Some("b,c")
    );
}

#[test]
fn job_degree_clamps_to_max() {
    let config = JobConfig::from_store_keys(&keys(&[("jobDegree", "9")])).unwrap();
    assert_eq!(config.job_degree, MAX_JOB_DEGREE);
}

#[yare::parameterized(
    count = { "shardingTotalCount" },
    level = { "loadLevel" },
    degree = { "jobDegree" },
    timeout = { "timeout4AlarmSeconds" },
)]
fn malformed_int_is_a_config_error(key: &str) {
    let result = JobConfig::from_store_keys(&keys(&[(key, "not-a-number")]));
    assert!(matches!(result, Err(ConfigError::BadInt { .. })));
}

#[test]
fn malformed_sharding_params_is_a_config_error() {
    let result = JobConfig::from_store_keys(&keys(&[("shardingItemParameters", "0")]));
    assert!(matches!(result, Err(ConfigError::Params(_))));
}

#[test]
fn malformed_pause_period_is_a_config_error() {
    let result = JobConfig::from_store_keys(&keys(&[("pausePeriodDate", "25/12-1/5")]));
    assert!(matches!(result, Err(ConfigError::Pause(_))));
}

#[test]
fn unknown_time_zone_is_a_config_error() {
    let result = JobConfig::from_store_keys(&keys(&[("timeZone", "Mars/Olympus")]));
    assert_eq!(result, Err(ConfigError::BadTimeZone("Mars/Olympus".to_string())));
}

#[test]
fn malformed_custom_context_is_tolerated() {
    let config = JobConfig::from_store_keys(&keys(&[("customContext", "{broken")])).unwrap();
    assert!(config.custom_context.is_empty());
}

#[yare::parameterized(
    java    = { "JAVA_JOB", JobType::Java },
    shell   = { "SHELL_JOB", JobType::Shell },
    passive = { "PASSIVE_JAVA_JOB", JobType::Passive },
    other   = { "MSG_JOB", JobType::Unknown },
)]
fn job_type_parsing(value: &str, expected: JobType) {
    let config = JobConfig::from_store_keys(&keys(&[("jobType", value)])).unwrap();
    assert_eq!(config.job_type, expected);
}

#[test]
fn pause_evaluation_uses_configured_zone() {
    let config = JobConfig::from_store_keys(&keys(&[
        ("timeZone", "Asia/Shanghai"),
        ("pausePeriodTime", "9:00-10:00"),
    ]))
    .unwrap();
    // 2026-06-15 09:30 Asia/Shanghai == 01:30 UTC.
    let epoch_ms = 1_781_487_000_000;
    let utc_config =
        JobConfig::from_store_keys(&keys(&[("pausePeriodTime", "9:00-10:00")])).unwrap();
    assert_ne!(config.is_paused_at(epoch_ms), utc_config.is_paused_at(epoch_ms));
}

#[test]
fn view_projects_engine_fields() {
    let config = JobConfig::from_store_keys(&keys(&[
        ("enabled", "true"),
        ("shardingTotalCount", "4"),
        ("loadLevel", "2"),
        ("failover", "false"),
    ]))
    .unwrap();
    let view = config.view();
    assert!(view.enabled);
    assert_eq!(view.sharding_total_count, 4);
    assert_eq!(view.load_level, 2);
    assert!(!view.failover);
    assert!(!view.local_mode);
}
