//! Target periods and their date bounds

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// How far a period reaches either side of its target year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowRadius {
    /// The target year only
    Exact,
    /// One year either side
    OneYear,
    /// Two years either side
    TwoYears,
}

impl WindowRadius {
    pub fn years(self) -> i32 {
        match self {
            Self::Exact => 0,
            Self::OneYear => 1,
            Self::TwoYears => 2,
        }
    }
}

impl fmt::Display for WindowRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            r => write!(f, "±{}y", r.years()),
        }
    }
}

/// Inclusive calendar date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A target year widened by a [`WindowRadius`].
///
/// Covers `year - r` Jan 1 through `year + r` Dec 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimePeriod {
    year: i32,
    radius: WindowRadius,
    range: DateRange,
}

impl TimePeriod {
    /// Years accepted as targets
    pub const YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

    pub fn new(year: i32, radius: WindowRadius) -> Result<Self> {
        if !Self::YEARS.contains(&year) {
            return Err(EngineError::InvalidPeriod {
                year,
                reason: format!(
                    "outside {}..={}",
                    Self::YEARS.start(),
                    Self::YEARS.end()
                ),
            });
        }
        let r = radius.years();
        let start = NaiveDate::from_ymd_opt(year - r, 1, 1);
        let end = NaiveDate::from_ymd_opt(year + r, 12, 31);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(EngineError::InvalidPeriod {
                year,
                reason: "date bounds not representable".into(),
            });
        };
        Ok(Self {
            year,
            radius,
            range: DateRange { start, end },
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn radius(&self) -> WindowRadius {
        self.radius
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Same target year, different radius
    pub fn widened(&self, radius: WindowRadius) -> Result<Self> {
        Self::new(self.year, radius)
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.year, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exact_window_is_one_calendar_year() {
        let p = TimePeriod::new(2005, WindowRadius::Exact).unwrap();
        assert_eq!(p.range().start, date(2005, 1, 1));
        assert_eq!(p.range().end, date(2005, 12, 31));
    }

    #[test]
    fn radius_widens_both_sides() {
        let p = TimePeriod::new(2005, WindowRadius::TwoYears).unwrap();
        assert_eq!(p.range().start, date(2003, 1, 1));
        assert_eq!(p.range().end, date(2007, 12, 31));
        assert!(p.range().contains(date(2003, 6, 1)));
        assert!(!p.range().contains(date(2008, 1, 1)));

        let one = p.widened(WindowRadius::OneYear).unwrap();
        assert_eq!(one.range().start, date(2004, 1, 1));
        assert_eq!(one.year(), 2005);
    }

    #[test]
    fn rejects_out_of_range_year() {
        assert!(TimePeriod::new(-5, WindowRadius::Exact).is_err());
        assert!(TimePeriod::new(10_000, WindowRadius::Exact).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(WindowRadius::Exact.to_string(), "exact");
        assert_eq!(WindowRadius::OneYear.to_string(), "±1y");
    }
}
