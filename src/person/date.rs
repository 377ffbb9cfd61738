//! Genealogical dates with a precision tag.
//!
//! Lineage data rarely carries clean calendar dates: a birth may be known to
//! the day, to the year, to the decade, or only as an estimate or a range.
//! `DateInfo` keeps whatever parts are known alongside a `DatePrecision` tag
//! so downstream consumers (ordering, timeline placement, labels) can decide
//! how much to trust the value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How much of a date is actually known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    /// Known to the day.
    Exact,
    /// Known to the month.
    Month,
    /// Known to the year.
    Year,
    /// Known to the decade (year holds the decade start, e.g. 1890).
    Decade,
    /// A single-year estimate.
    Estimated,
    /// Somewhere between `year` and `end_year`.
    Range,
    /// Nothing usable recorded.
    Unknown,
}

/// A date with partial fields and a precision tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInfo {
    /// Calendar year, or the range start for `Range` precision.
    pub year: Option<i32>,
    /// 1-based month, when known.
    pub month: Option<u8>,
    /// 1-based day of month, when known.
    pub day: Option<u8>,
    /// Range end year (only meaningful for `Range` precision).
    pub end_year: Option<i32>,
    /// Precision tag describing how to read the fields above.
    pub precision: DatePrecision,
}

impl DateInfo {
    /// A date known to the day.
    pub fn exact(year: i32, month: u8, day: u8) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            end_year: None,
            precision: DatePrecision::Exact,
        }
    }

    /// A date known to the month.
    pub fn month(year: i32, month: u8) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: None,
            end_year: None,
            precision: DatePrecision::Month,
        }
    }

    /// A date known to the year.
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
            day: None,
            end_year: None,
            precision: DatePrecision::Year,
        }
    }

    /// A decade, identified by its starting year (e.g. 1890 for the 1890s).
    pub fn decade(decade_start: i32) -> Self {
        Self {
            year: Some(decade_start),
            month: None,
            day: None,
            end_year: None,
            precision: DatePrecision::Decade,
        }
    }

    /// A single-year estimate.
    pub fn estimated(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
            day: None,
            end_year: None,
            precision: DatePrecision::Estimated,
        }
    }

    /// A year range (inclusive at both ends).
    pub fn range(start: i32, end: i32) -> Self {
        Self {
            year: Some(start),
            month: None,
            day: None,
            end_year: Some(end),
            precision: DatePrecision::Range,
        }
    }

    /// A date with nothing usable recorded.
    pub fn unknown() -> Self {
        Self {
            year: None,
            month: None,
            day: None,
            end_year: None,
            precision: DatePrecision::Unknown,
        }
    }

    /// Best single year for ordering and timeline placement.
    ///
    /// Returns the midpoint for a range, the decade midpoint for decades,
    /// and `None` when the precision is `Unknown` or no year is recorded.
    pub fn sort_year(&self) -> Option<i32> {
        match self.precision {
            DatePrecision::Unknown => None,
            DatePrecision::Range => {
                let start = self.year?;
                let end = self.end_year.unwrap_or(start);
                Some(start + (end - start) / 2)
            }
            DatePrecision::Decade => self.year.map(|y| y + 5),
            _ => self.year,
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl fmt::Display for DateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            DatePrecision::Exact => match (self.year, self.month, self.day) {
                (Some(y), Some(m), Some(d)) if (1..=12).contains(&m) => {
                    write!(f, "{} {} {}", d, MONTH_NAMES[(m - 1) as usize], y)
                }
                (Some(y), _, _) => write!(f, "{y}"),
                _ => write!(f, "?"),
            },
            DatePrecision::Month => match (self.year, self.month) {
                (Some(y), Some(m)) if (1..=12).contains(&m) => {
                    write!(f, "{} {}", MONTH_NAMES[(m - 1) as usize], y)
                }
                (Some(y), _) => write!(f, "{y}"),
                _ => write!(f, "?"),
            },
            DatePrecision::Year => match self.year {
                Some(y) => write!(f, "{y}"),
                None => write!(f, "?"),
            },
            DatePrecision::Decade => match self.year {
                Some(y) => write!(f, "{y}s"),
                None => write!(f, "?"),
            },
            DatePrecision::Estimated => match self.year {
                Some(y) => write!(f, "c. {y}"),
                None => write!(f, "?"),
            },
            DatePrecision::Range => match (self.year, self.end_year) {
                (Some(a), Some(b)) => write!(f, "{a}\u{2013}{b}"),
                (Some(a), None) => write!(f, "{a}"),
                _ => write!(f, "?"),
            },
            DatePrecision::Unknown => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_year_plain() {
        assert_eq!(DateInfo::year(1901).sort_year(), Some(1901));
        assert_eq!(DateInfo::exact(1901, 3, 14).sort_year(), Some(1901));
        assert_eq!(DateInfo::estimated(1850).sort_year(), Some(1850));
    }

    #[test]
    fn test_sort_year_range_midpoint() {
        assert_eq!(DateInfo::range(1900, 1910).sort_year(), Some(1905));
        assert_eq!(DateInfo::range(1900, 1901).sort_year(), Some(1900));
    }

    #[test]
    fn test_sort_year_decade_midpoint() {
        assert_eq!(DateInfo::decade(1890).sort_year(), Some(1895));
    }

    #[test]
    fn test_sort_year_unknown() {
        assert_eq!(DateInfo::unknown().sort_year(), None);
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(DateInfo::exact(1901, 3, 14).to_string(), "14 Mar 1901");
        assert_eq!(DateInfo::month(1901, 3).to_string(), "Mar 1901");
        assert_eq!(DateInfo::year(1901).to_string(), "1901");
        assert_eq!(DateInfo::decade(1890).to_string(), "1890s");
        assert_eq!(DateInfo::estimated(1850).to_string(), "c. 1850");
        assert_eq!(DateInfo::range(1900, 1910).to_string(), "1900\u{2013}1910");
        assert_eq!(DateInfo::unknown().to_string(), "?");
    }
}
