// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff for transient store errors.

use crate::error::CoordResult;
use std::future::Future;
use std::time::Duration;

/// Backoff configuration: delays double from `base` and are capped at
/// `max`; at most `retries` re-attempts follow the first try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max: Duration,
    pub retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { base: Duration::from_millis(100), max: Duration::from_secs(3), retries: 3 }
    }
}

impl RetryPolicy {
    /// A policy that never retries, for paths that handle errors
    /// themselves.
    pub const fn none() -> Self {
        Self { base: Duration::ZERO, max: Duration::ZERO, retries: 0 }
    }

    /// Delay before re-attempt number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.checked_mul(factor).unwrap_or(self.max).min(self.max)
    }
}

/// Run `op`, retrying transient failures per `policy`.
///
/// Non-transient errors (`NoNode`, `NodeExists`, `BadVersion`,
/// `SessionExpired`) return immediately.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> CoordResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoordResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < policy.retries => {
                let delay = policy.delay(attempt);
                tracing::debug!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "retrying store operation");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
