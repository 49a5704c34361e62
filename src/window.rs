//! Date range iteration
//!
//! A [`DateRange`] lazily yields the [`DateWindow`]s an extraction run queries,
//! in ascending order, from the start date through the end boundary
//! (both inclusive). Windows are one day wide unless configured otherwise; the
//! last window is clipped so it never reaches past the end boundary.

use chrono::{Duration, NaiveDate};
use std::fmt;

/// Half-open `[start, end)` date interval covered by one API request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateWindow {
    /// First day in the window
    pub start: NaiveDate,
    /// First day after the window
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window covering exactly one calendar day
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day + Duration::days(1),
        }
    }

    /// Number of days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Last day included in the window
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }

    /// Whether `date` falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days() == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.last_day())
        }
    }
}

/// Lazy, finite, ascending sequence of [`DateWindow`]s
#[derive(Debug)]
pub struct DateRange {
    next: NaiveDate,
    end_inclusive: NaiveDate,
    window_days: i64,
}

impl DateRange {
    /// Daily windows from `start` through `end_inclusive`.
    ///
    /// Yields nothing when `start` is after `end_inclusive`.
    pub fn new(start: NaiveDate, end_inclusive: NaiveDate) -> Self {
        Self {
            next: start,
            end_inclusive,
            window_days: 1,
        }
    }

    /// Use windows of `days` days (values below 1 are treated as 1)
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = i64::from(days.max(1));
        self
    }

    fn remaining_days(&self) -> i64 {
        ((self.end_inclusive - self.next).num_days() + 1).max(0)
    }
}

impl Iterator for DateRange {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end_inclusive {
            return None;
        }

        let start = self.next;
        let span = self.window_days.min(self.remaining_days());
        let end = start + Duration::days(span);
        self.next = end;

        Some(DateWindow { start, end })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let days = self.remaining_days();
        let windows = (days + self.window_days - 1) / self.window_days;
        let windows = usize::try_from(windows).unwrap_or(0);
        (windows, Some(windows))
    }
}

impl ExactSizeIterator for DateRange {}

impl std::iter::FusedIterator for DateRange {}
