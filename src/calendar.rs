use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{0}' is not a YYYY-MM-DD date")]
pub struct DateParseError(pub String);

/// Inclusive calendar-date range. Serializes as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", format_iso(self.start), format_iso(self.end))
    }
}

/// Sunday-through-Saturday week containing `date`.
pub fn week_range(date: NaiveDate) -> DateRange {
    let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

pub fn month_range(date: NaiveDate) -> DateRange {
    let start = date.with_day(1).unwrap_or(date);
    let next_month = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .unwrap_or(start);
    DateRange { start, end }
}

/// Moves `date` by whole weeks, as the Prev/Next buttons do.
pub fn shift_weeks(date: NaiveDate, offset: i64) -> NaiveDate {
    date + Duration::weeks(offset)
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_us(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

pub fn week_label(range: &DateRange) -> String {
    format!("Week of {}", range.start.format("%B %-d, %Y"))
}

/// Years the week and month arithmetic is defined for.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

pub fn parse_iso(text: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| SUPPORTED_YEARS.contains(&date.year()))
        .ok_or_else(|| DateParseError(text.to_string()))
}
