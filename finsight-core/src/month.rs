//! Calendar-month keys and the half-open UTC windows used for history lookups.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Years are limited to what `YYYY` can spell.
    pub const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            anyhow::bail!("month out of range: {month}");
        }
        if !Self::YEARS.contains(&year) {
            anyhow::bail!("year out of range: {year}");
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month containing `now` as seen from the IANA timezone `tz`.
    pub fn current_in(tz: &str, now: DateTime<Utc>) -> Result<Self> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
        let local = now.with_timezone(&tz);
        Self::new(local.year(), local.month())
    }

    pub fn first_day(&self) -> NaiveDate {
        // year and month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Midnight UTC on the first of the month.
    pub fn start_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.first_day().and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// Move by whole months; negative goes back. Fails when the result
    /// leaves [`MonthKey::YEARS`].
    pub fn shift(&self, months: i64) -> Result<Self> {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + months;
        let year = i32::try_from(index.div_euclid(12))
            .map_err(|_| anyhow::anyhow!("{self} shifted by {months} months is out of range"))?;
        Self::new(year, index.rem_euclid(12) as u32 + 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("invalid month '{s}': expected YYYY-MM"))?;
        let year: i32 = y
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid year in '{s}': {e}"))?;
        let month: u32 = m
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid month in '{s}': {e}"))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

/// Half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// The `months` calendar months immediately before `target`, excluding `target` itself.
    pub fn trailing_months(target: MonthKey, months: u32) -> Result<Self> {
        Ok(Self {
            start: target.shift(-i64::from(months))?.start_utc(),
            end: target.start_utc(),
        })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}
