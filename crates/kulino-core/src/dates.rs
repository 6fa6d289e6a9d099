//! # Calendar Dates
//!
//! Report and ledger filters take calendar days, typed by people in either
//! `YYYY-MM-DD` (date pickers) or `DD/MM/YYYY` (as printed on reports).
//!
//! ## Range Semantics
//! ```text
//!   startDate=2024-03-01          endDate=2024-03-31
//!         │                             │
//!         ▼                             ▼
//!   2024-03-01T00:00:00Z  <=  date  <  2024-04-01T00:00:00Z
//!      (inclusive)                       (exclusive: whole last day)
//! ```
//! Days are UTC days. Either bound may be absent.

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY` (single-digit day/month accepted).
///
/// ## Example
/// ```rust
/// use kulino_core::dates::parse_calendar_date;
///
/// let a = parse_calendar_date("startDate", "2024-03-05").unwrap();
/// let b = parse_calendar_date("startDate", "5/3/2024").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_calendar_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not YYYY-MM-DD or DD/MM/YYYY", raw),
        })
}

/// Midnight UTC at the start of `day`.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Formats as `DD/MM/YYYY`.
pub fn format_display_date(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}

/// Drops sub-second precision so that every row written by one operation
/// carries the identical instant.
pub fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// Resolves an optional caller-supplied calendar date: midnight UTC of that
/// day when given, `fallback` otherwise.
pub fn date_or(
    field: &str,
    raw: Option<&str>,
    fallback: DateTime<Utc>,
) -> ValidationResult<DateTime<Utc>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(start_of_day(parse_calendar_date(field, raw)?)),
        None => Ok(truncate_to_seconds(fallback)),
    }
}

// =============================================================================
// DateRange
// =============================================================================

/// A half-open UTC interval built from calendar-day bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    first_day: Option<NaiveDate>,
    last_day: Option<NaiveDate>,
}

impl DateRange {
    /// Everything.
    pub fn all() -> Self {
        DateRange::default()
    }

    /// Parses optional `startDate` / `endDate` query values. Empty strings
    /// count as absent; anything else must parse.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> ValidationResult<Self> {
        let parse = |field: &str, raw: Option<&str>| -> ValidationResult<Option<NaiveDate>> {
            match raw.map(str::trim).filter(|s| !s.is_empty()) {
                Some(raw) => parse_calendar_date(field, raw).map(Some),
                None => Ok(None),
            }
        };

        let range = DateRange {
            first_day: parse("startDate", start)?,
            last_day: parse("endDate", end)?,
        };

        if let (Some(first), Some(last)) = (range.first_day, range.last_day) {
            if first > last {
                return Err(ValidationError::InvalidFormat {
                    field: "endDate".to_string(),
                    reason: "must not be before startDate".to_string(),
                });
            }
        }

        Ok(range)
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.first_day.map(start_of_day)
    }

    /// Exclusive upper bound: midnight after the last day.
    pub fn end_exclusive(&self) -> Option<DateTime<Utc>> {
        self.last_day
            .and_then(|day| day.succ_opt())
            .map(start_of_day)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start().map_or(true, |s| instant >= s)
            && self.end_exclusive().map_or(true, |e| instant < e)
    }

    /// Bounds as printed on reports.
    pub fn display(&self) -> DisplayRange {
        DisplayRange {
            start_date: self.first_day.map(format_display_date),
            end_date: self.last_day.map(format_display_date),
        }
    }
}

/// `DD/MM/YYYY` bounds of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DisplayRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DisplayRange {
    /// One-line period description for report headers.
    pub fn period_label(&self) -> String {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) if start == end => start.clone(),
            (Some(start), Some(end)) => format!("{} - {}", start, end),
            (Some(start), None) => format!("From {}", start),
            (None, Some(end)) => format!("Until {}", end),
            (None, None) => "All time".to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
