//! Calendar month key used to bucket transactions.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike as _, NaiveDate};

use crate::error::FinTrackError;

/// A calendar month, ordered chronologically.
///
/// Displays as `YYYY-MM`, so the textual and the chronological order agree
/// for years 0..=9999. The year is part of the key: March 2023 and March
/// 2024 are different months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    /// Calendar year.
    year: i32,
    /// Month of the year, 1-based.
    month: u32,
}

impl MonthKey {
    /// Creates a key, returning `None` unless `month` is in `1..=12`.
    #[inline]
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if matches!(month, 1..=12) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Returns the month a date belongs to.
    #[inline]
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[inline]
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month of the year, 1-based.
    #[inline]
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Returns `true` if `date` falls in this month.
    #[inline]
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }
}

impl fmt::Display for MonthKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = FinTrackError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FinTrackError::InvalidInput(format!("expected YYYY-MM, got {s:?}"));
        let (year_part, month_part) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year_part.parse::<i32>().map_err(|_err| invalid())?;
        let month = month_part.parse::<u32>().map_err(|_err| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(MonthKey::of(date(2024, 3, 9)).to_string(), "2024-03");
    }

    #[test]
    fn same_month_different_years_differ() {
        let a = MonthKey::of(date(2023, 3, 1));
        let b = MonthKey::of(date(2024, 3, 1));
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn ordering_is_chronological() {
        let dec = MonthKey::new(2023, 12).unwrap();
        let jan = MonthKey::new(2024, 1).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(MonthKey::new(2024, 0).is_none());
        assert!(MonthKey::new(2024, 13).is_none());
    }

    #[test]
    fn parses_from_string() {
        let key: MonthKey = "2024-07".parse().unwrap();
        assert_eq!(key, MonthKey::new(2024, 7).unwrap());
        assert!("2024/07".parse::<MonthKey>().is_err());
        assert!("2024-13".parse::<MonthKey>().is_err());
    }

    #[test]
    fn contains_checks_year_and_month() {
        let key = MonthKey::new(2024, 2).unwrap();
        assert!(key.contains(date(2024, 2, 29)));
        assert!(!key.contains(date(2023, 2, 28)));
    }
}
