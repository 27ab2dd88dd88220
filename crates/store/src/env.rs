// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the store crate.

use std::time::Duration;

/// Session timeout override, seconds; clamped to `[20, 40]`.
pub const SESSION_TIMEOUT_ENV: &str = "VIP_SATURN_ZK_CLIENT_SESSION_TIMEOUT_IN_SECONDS";

/// Connection timeout override, seconds; clamped to `[20, 60]`.
pub const CONNECTION_TIMEOUT_ENV: &str = "VIP_SATURN_ZK_CLIENT_CONNECTION_TIMEOUT_IN_SECONDS";

/// Session-level timeouts handed to store client construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub session_timeout: Duration,
    pub connection_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(20),
            connection_timeout: Duration::from_secs(20),
        }
    }
}

impl SessionSettings {
    /// Read both overrides from the environment, clamping each into its
    /// contract range. Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_timeout: clamped_secs(SESSION_TIMEOUT_ENV, defaults.session_timeout, 20, 40),
            connection_timeout: clamped_secs(
                CONNECTION_TIMEOUT_ENV,
                defaults.connection_timeout,
                20,
                60,
            ),
        }
    }
}

fn clamped_secs(var: &str, default: Duration, min: u64, max: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs.clamp(min, max)))
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
