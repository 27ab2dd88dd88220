// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pause-period parsing and evaluation.
//!
//! `pausePeriodDate` is `"M/d-M/d(,M/d-M/d)*"` and `pausePeriodTime` is
//! `"H:m-H:m(,H:m-H:m)*"`, both evaluated in the job's time zone. A
//! timestamp is paused iff (date ranges empty OR one matches) AND (time
//! ranges empty OR one matches); both empty means never paused. Ranges
//! are inclusive and may wrap the year end / midnight.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PauseFormatError {
    #[error("bad date range {0:?} (expected M/d-M/d)")]
    BadDateRange(String),
    #[error("bad time range {0:?} (expected H:m-H:m)")]
    BadTimeRange(String),
    #[error("month {0} out of range")]
    BadMonth(u32),
    #[error("day {0} out of range")]
    BadDay(u32),
    #[error("hour {0} out of range")]
    BadHour(u32),
    #[error("minute {0} out of range")]
    BadMinute(u32),
}

/// A month/day point, year-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    fn parse(s: &str) -> Result<Self, PauseFormatError> {
        let bad = || PauseFormatError::BadDateRange(s.to_string());
        let (m, d) = s.split_once('/').ok_or_else(bad)?;
        let month: u32 = m.trim().parse().map_err(|_| bad())?;
        let day: u32 = d.trim().parse().map_err(|_| bad())?;
        if !(1..=12).contains(&month) {
            return Err(PauseFormatError::BadMonth(month));
        }
        if !(1..=31).contains(&day) {
            return Err(PauseFormatError::BadDay(day));
        }
        Ok(Self { month, day })
    }

    fn ordinal(self) -> u32 {
        self.month * 100 + self.day
    }
}

/// A minute-of-day point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    fn parse(s: &str) -> Result<Self, PauseFormatError> {
        let bad = || PauseFormatError::BadTimeRange(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(bad)?;
        let hour: u32 = h.trim().parse().map_err(|_| bad())?;
        let minute: u32 = m.trim().parse().map_err(|_| bad())?;
        if hour > 23 {
            return Err(PauseFormatError::BadHour(hour));
        }
        if minute > 59 {
            return Err(PauseFormatError::BadMinute(minute));
        }
        Ok(Self { hour, minute })
    }

    fn minute_of_day(self) -> u32 {
        self.hour * 60 + self.minute
    }
}

/// An inclusive range between two year-agnostic dates; wraps the year
/// end when `from > to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: MonthDay,
    pub to: MonthDay,
}

impl DateRange {
    fn contains(&self, at: MonthDay) -> bool {
        let (from, to, at) = (self.from.ordinal(), self.to.ordinal(), at.ordinal());
        if from <= to {
            (from..=to).contains(&at)
        } else {
            at >= from || at <= to
        }
    }
}

/// An inclusive range between two minute-of-day points; wraps midnight
/// when `from > to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: TimeOfDay,
    pub to: TimeOfDay,
}

impl TimeRange {
    fn contains(&self, at: TimeOfDay) -> bool {
        let (from, to, at) =
            (self.from.minute_of_day(), self.to.minute_of_day(), at.minute_of_day());
        if from <= to {
            (from..=to).contains(&at)
        } else {
            at >= from || at <= to
        }
    }
}

/// Parsed pause periods of one job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausePeriod {
    dates: Vec<DateRange>,
    times: Vec<TimeRange>,
}

impl PausePeriod {
    /// Parse the two config values; either may be empty.
    pub fn parse(date_spec: &str, time_spec: &str) -> Result<Self, PauseFormatError> {
        let mut dates = Vec::new();
        for range in split_nonempty(date_spec) {
            let (from, to) = range
                .split_once('-')
                .ok_or_else(|| PauseFormatError::BadDateRange(range.to_string()))?;
            dates.push(DateRange { from: MonthDay::parse(from)?, to: MonthDay::parse(to)? });
        }
        let mut times = Vec::new();
        for range in split_nonempty(time_spec) {
            let (from, to) = range
                .split_once('-')
                .ok_or_else(|| PauseFormatError::BadTimeRange(range.to_string()))?;
            times.push(TimeRange { from: TimeOfDay::parse(from)?, to: TimeOfDay::parse(to)? });
        }
        Ok(Self { dates, times })
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.times.is_empty()
    }

    /// Whether the timestamp falls inside a pause window, evaluated in
    /// `tz`.
    pub fn is_paused_at(&self, epoch_ms: u64, tz: Tz) -> bool {
        if self.is_empty() {
            return false;
        }
        let utc: DateTime<Utc> = match Utc.timestamp_millis_opt(epoch_ms as i64).single() {
            Some(t) => t,
            None => return false,
        };
        let local = utc.with_timezone(&tz);
        let date = MonthDay { month: local.month(), day: local.day() };
        let time = TimeOfDay { hour: local.hour(), minute: local.minute() };

        let date_matches =
            self.dates.is_empty() || self.dates.iter().any(|r| r.contains(date));
        let time_matches =
            self.times.is_empty() || self.times.iter().any(|r| r.contains(time));
        date_matches && time_matches
    }
}

fn split_nonempty(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "pause_tests.rs"]
mod tests;
