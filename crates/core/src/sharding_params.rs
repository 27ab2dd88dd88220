// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for the `shardingItemParameters` job config value.
//!
//! The format is a CSV of `key=value` elements where commas inside
//! double-quoted runs do not split, e.g. `0=a,1="b,c"`. Keys are shard
//! ids or `*` (the local-mode wildcard). Parsing fails on any malformed
//! element.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("empty element at position {0}")]
    EmptyElement(usize),
    #[error("missing '=' in element {0:?}")]
    MissingSeparator(String),
    #[error("bad shard key {0:?} (expected integer or '*')")]
    BadKey(String),
    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),
}

/// A shard-item parameter key: a concrete shard id or the local-mode
/// wildcard `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShardKey {
    Item(i32),
    Wildcard,
}

impl std::fmt::Display for ShardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShardKey::Item(n) => write!(f, "{n}"),
            ShardKey::Wildcard => f.write_str("*"),
        }
    }
}

/// Parsed `shardingItemParameters`, order-preserving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingItemParameters {
    entries: Vec<(ShardKey, String)>,
}

impl ShardingItemParameters {
    pub fn parse(input: &str) -> Result<Self, ParamsError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut entries = Vec::new();
        for (idx, element) in split_outside_quotes(input)?.into_iter().enumerate() {
            let element = element.trim();
            if element.is_empty() {
                return Err(ParamsError::EmptyElement(idx));
            }
            let (key, value) = element
                .split_once('=')
                .ok_or_else(|| ParamsError::MissingSeparator(element.to_string()))?;
            let key = match key.trim() {
                "*" => ShardKey::Wildcard,
                k => ShardKey::Item(
                    k.parse::<i32>().map_err(|_| ParamsError::BadKey(k.to_string()))?,
                ),
            };
            entries.push((key, unquote(value.trim())));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: ShardKey) -> Option<&str> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(ShardKey, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back to the CSV form, re-quoting values that contain
    /// commas so that `parse(serialize(p)) == p`.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| {
                if v.contains(',') {
                    format!("{k}=\"{v}\"")
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Split `input` on commas that are outside double-quoted runs.
fn split_outside_quotes(input: &str) -> Result<Vec<String>, ParamsError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return Err(ParamsError::UnterminatedQuote(input.to_string()));
    }
    parts.push(current);
    Ok(parts)
}

/// Strip one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
#[path = "sharding_params_tests.rs"]
mod tests;
