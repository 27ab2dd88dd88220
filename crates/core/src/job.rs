// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job configuration as stored under `/jobs/<job>/config/*`.

use crate::id::ExecutorId;
use crate::pause::{PauseFormatError, PausePeriod};
use crate::sharding_params::{ParamsError, ShardingItemParameters};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Highest accepted `jobDegree`; larger stored values are clamped.
pub const MAX_JOB_DEGREE: u8 = 5;

/// Errors from interpreting a job's config subtree.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config key {key}: bad integer {value:?}")]
    BadInt { key: &'static str, value: String },
    #[error("config key shardingItemParameters: {0}")]
    Params(#[from] ParamsError),
    #[error("pause period: {0}")]
    Pause(#[from] PauseFormatError),
    #[error("config key timeZone: unknown zone {0:?}")]
    BadTimeZone(String),
}

/// Kind of work a job runs; the coordinator only carries it through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    Java,
    Shell,
    Passive,
    Unknown,
}

impl JobType {
    fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "JAVA_JOB" | "JAVA" => JobType::Java,
            "SHELL_JOB" | "SHELL" => JobType::Shell,
            "PASSIVE_JAVA_JOB" | "PASSIVE_SHELL_JOB" | "PASSIVE" => JobType::Passive,
            _ => JobType::Unknown,
        }
    }
}

crate::simple_display! {
    JobType {
        Java => "java",
        Shell => "shell",
        Passive => "passive",
        Unknown => "unknown",
    }
}

/// Full parsed job configuration.
///
/// Every recognized key of the store contract is carried; the sharding
/// engine itself consumes the [`JobView`] projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub enabled: bool,
    pub local_mode: bool,
    pub sharding_total_count: u32,
    pub load_level: u32,
    pub prefer_list: Vec<ExecutorId>,
    pub use_disprefer_list: bool,
    pub failover: bool,
    pub job_type: JobType,
    pub time_zone: Tz,
    pub pause_period: PausePeriod,
    pub timeout_alarm_seconds: u64,
    pub job_degree: u8,
    pub enabled_report: bool,
    pub queue_name: Option<String>,
    pub channel_name: Option<String>,
    pub custom_context: HashMap<String, String>,
    pub sharding_item_parameters: ShardingItemParameters,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            local_mode: false,
            sharding_total_count: 0,
            load_level: 1,
            prefer_list: Vec::new(),
            use_disprefer_list: false,
            failover: true,
            job_type: JobType::default(),
            time_zone: chrono_tz::UTC,
            pause_period: PausePeriod::default(),
            timeout_alarm_seconds: 0,
            job_degree: 0,
            enabled_report: true,
            queue_name: None,
            channel_name: None,
            custom_context: HashMap::new(),
            sharding_item_parameters: ShardingItemParameters::default(),
        }
    }
}

impl JobConfig {
    /// Interpret the `/jobs/<job>/config/<key>` children.
    ///
    /// Missing keys fall back to defaults; present-but-malformed values
    /// are configuration errors, which make the engine skip the job for
    /// the turn and raise an alarm.
    pub fn from_store_keys(keys: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = JobConfig::default();

        let prefer_list = match keys.get("preferList") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ExecutorId::new)
                .collect(),
            None => Vec::new(),
        };
        let time_zone = match keys.get("timeZone").map(|z| z.trim()).filter(|z| !z.is_empty()) {
            Some(zone) => {
                zone.parse().map_err(|_| ConfigError::BadTimeZone(zone.to_string()))?
            }
            None => defaults.time_zone,
        };
        let date_spec = keys.get("pausePeriodDate").map(String::as_str).unwrap_or("");
        let time_spec = keys.get("pausePeriodTime").map(String::as_str).unwrap_or("");
        let degree: u32 = parse_int(keys.get("jobDegree"), "jobDegree", 0)?;
        // Tolerated when malformed: the context is opaque to the
        // coordinator and only carried for executors.
        let custom_context = keys
            .get("customContext")
            .filter(|s| !s.trim().is_empty())
            .and_then(|ctx| serde_json::from_str(ctx).ok())
            .unwrap_or_default();
        let sharding_item_parameters = match keys.get("shardingItemParameters") {
            Some(params) => ShardingItemParameters::parse(params)?,
            None => ShardingItemParameters::default(),
        };

        Ok(JobConfig {
            enabled: parse_bool(keys.get("enabled"), defaults.enabled),
            local_mode: parse_bool(keys.get("localMode"), defaults.local_mode),
            sharding_total_count: parse_int(
                keys.get("shardingTotalCount"),
                "shardingTotalCount",
                0,
            )?,
            load_level: parse_int(keys.get("loadLevel"), "loadLevel", 1)?,
            prefer_list,
            use_disprefer_list: parse_bool(
                keys.get("useDispreferList"),
                defaults.use_disprefer_list,
            ),
            failover: parse_bool(keys.get("failover"), defaults.failover),
            job_type: keys.get("jobType").map(|k| JobType::parse(k)).unwrap_or_default(),
            time_zone,
            pause_period: PausePeriod::parse(date_spec, time_spec)?,
            timeout_alarm_seconds: parse_int(
                keys.get("timeout4AlarmSeconds"),
                "timeout4AlarmSeconds",
                0,
            )?,
            job_degree: degree.min(MAX_JOB_DEGREE as u32) as u8,
            enabled_report: parse_bool(keys.get("enabledReport"), defaults.enabled_report),
            queue_name: keys.get("queueName").filter(|s| !s.is_empty()).cloned(),
            channel_name: keys.get("channelName").filter(|s| !s.is_empty()).cloned(),
            custom_context,
            sharding_item_parameters,
        })
    }

    /// Whether the job is paused at the given timestamp.
    pub fn is_paused_at(&self, epoch_ms: u64) -> bool {
        self.pause_period.is_paused_at(epoch_ms, self.time_zone)
    }

    /// Projection consumed by the sharding engine.
    pub fn view(&self) -> JobView {
        JobView {
            enabled: self.enabled,
            local_mode: self.local_mode,
            sharding_total_count: self.sharding_total_count,
            load_level: self.load_level,
            prefer_list: self.prefer_list.clone(),
            use_disprefer_list: self.use_disprefer_list,
            failover: self.failover,
            job_degree: self.job_degree,
        }
    }
}

/// The slice of job configuration the sharding engine decides with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub enabled: bool,
    pub local_mode: bool,
    pub sharding_total_count: u32,
    pub load_level: u32,
    pub prefer_list: Vec<ExecutorId>,
    pub use_disprefer_list: bool,
    pub failover: bool,
    pub job_degree: u8,
}

crate::builder! {
    pub struct JobViewBuilder => JobView {
        set {
            enabled: bool = true,
            local_mode: bool = false,
            sharding_total_count: u32 = 4,
            load_level: u32 = 1,
            prefer_list: Vec<ExecutorId> = Vec::new(),
            use_disprefer_list: bool = false,
            failover: bool = true,
            job_degree: u8 = 0,
        }
    }
}

fn parse_bool(value: Option<&String>, default: bool) -> bool {
    match value {
        Some(v) => v.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

fn parse_int<T: std::str::FromStr>(
    value: Option<&String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadInt { key, value: v.clone() }),
        _ => Ok(default),
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
