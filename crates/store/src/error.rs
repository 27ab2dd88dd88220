// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uniform error type for coordination store operations.

use thiserror::Error;

pub type CoordResult<T> = Result<T, CoordError>;

/// Errors from store operations.
///
/// Transient kinds are recovered locally by the retry policy; the
/// engine degrades anything that survives retries into a resync.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordError {
    #[error("no node at {0}")]
    NoNode(String),
    #[error("node already exists at {0}")]
    NodeExists(String),
    #[error("bad version at {path}: expected {expected}, found {actual}")]
    BadVersion { path: String, expected: i64, actual: i64 },
    #[error("connection loss")]
    ConnectionLoss,
    #[error("session expired")]
    SessionExpired,
    #[error("store i/o: {0}")]
    Io(String),
}

impl CoordError {
    /// Whether a retry with backoff can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoordError::ConnectionLoss | CoordError::Io(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
