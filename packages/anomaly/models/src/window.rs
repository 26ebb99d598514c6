//! Calendar date windows for target and baseline imagery.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// Errors from building a [`TimeWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    /// A date string is not `YYYY-MM-DD` or RFC 3339.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The window is empty or reversed.
    #[error("window start {start} must be before end {end}")]
    Empty {
        /// Window start.
        start: NaiveDate,
        /// Window end.
        end: NaiveDate,
    },
}

/// A half-open `[start, end)` date range, matching the EOS filter
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns [`TimeWindowError::Empty`] unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeWindowError> {
        if start >= end {
            return Err(TimeWindowError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses a window from two date strings.
    ///
    /// # Errors
    ///
    /// Returns [`TimeWindowError`] if either date fails to parse or the
    /// window is empty.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeWindowError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// The historical baseline preceding `target`: from `anchor` up to the
    /// target's start.
    ///
    /// # Errors
    ///
    /// Returns [`TimeWindowError::Empty`] if `anchor` is not before the
    /// target's start.
    pub fn baseline_before(anchor: NaiveDate, target: &Self) -> Result<Self, TimeWindowError> {
        Self::new(anchor, target.start)
    }

    /// First day of the window (inclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Day after the last day of the window (exclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Length of the window in days.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Parses `YYYY-MM-DD`, also accepting a full RFC 3339 timestamp and
/// keeping only its date.
///
/// # Errors
///
/// Returns [`TimeWindowError::InvalidDate`] if neither format matches.
pub fn parse_date(value: &str) -> Result<NaiveDate, TimeWindowError> {
    let trimmed = value.trim();
    trimmed
        .parse::<NaiveDate>()
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| TimeWindowError::InvalidDate(value.to_string()))
}
