//! Calendar dates as the portal and the on-disk artifacts spell them.
//!
//! Three renderings of one date are in play:
//!
//! - compact `YYYYMMDD`: portal URLs, listing file names, CLI output
//! - slashed `YYYY/MM/DD`: the date part of every listing timestamp
//! - ISO `YYYY-MM-DD`: detection dates in the cumulative store

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date '{0}': expected YYYYMMDD, YYYY-MM-DD or YYYY/MM/DD")]
    Invalid(String),
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: ListingDate, end: ListingDate },
}

/// A single trading-calendar day on the disclosure portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListingDate(NaiveDate);

impl ListingDate {
    /// Parse `YYYYMMDD`, `YYYY-MM-DD` or `YYYY/MM/DD`.
    ///
    /// Separators are stripped first, so mixed forms like `2026-0113` also
    /// pass as long as eight digits naming a real calendar day remain.
    pub fn parse(input: &str) -> Result<Self, DateError> {
        let cleaned: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '/')
            .collect();
        if cleaned.len() != 8 || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DateError::Invalid(input.to_string()));
        }
        NaiveDate::parse_from_str(&cleaned, "%Y%m%d")
            .map(Self)
            .map_err(|_| DateError::Invalid(input.to_string()))
    }

    /// Recover the date from the leading `YYYY/MM/DD` of a listing timestamp.
    ///
    /// Works for both `2026/01/13 08:30` and the bare `2026/01/13` carried by
    /// tombstones. Returns `None` for anything else.
    pub fn from_timestamp(timestamp: &str) -> Option<Self> {
        let head = timestamp.get(..10)?;
        NaiveDate::parse_from_str(head, "%Y/%m/%d").ok().map(Self)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// `YYYYMMDD`.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// `YYYY/MM/DD`.
    pub fn slashed(&self) -> String {
        self.0.format("%Y/%m/%d").to_string()
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }

    /// Every date from `start` to `end`, both inclusive, in ascending order.
    pub fn range(start: Self, end: Self) -> Result<Vec<Self>, DateError> {
        if start > end {
            return Err(DateError::InvertedRange { start, end });
        }
        let mut dates = Vec::new();
        let mut current = Some(start);
        while let Some(d) = current
            && d <= end
        {
            dates.push(d);
            current = d.succ();
        }
        Ok(dates)
    }
}

impl fmt::Display for ListingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for ListingDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> ListingDate {
        ListingDate::parse(s).unwrap()
    }

    #[test]
    fn parses_all_accepted_forms() {
        assert_eq!(d("20260113"), d("2026-01-13"));
        assert_eq!(d("2026/01/13"), d("20260113"));
        assert_eq!(d("  20260113 "), d("20260113"));
    }

    #[test]
    fn rejects_non_dates() {
        for bad in ["", "2026011", "202601131", "2026-13-01", "20260230", "abcdefgh"] {
            assert!(
                matches!(ListingDate::parse(bad), Err(DateError::Invalid(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn renders_each_form() {
        let date = d("20260105");
        assert_eq!(date.compact(), "20260105");
        assert_eq!(date.slashed(), "2026/01/05");
        assert_eq!(date.to_string(), "20260105");
    }

    #[test]
    fn timestamp_prefix_with_and_without_time() {
        assert_eq!(
            ListingDate::from_timestamp("2026/01/13 08:30"),
            Some(d("20260113"))
        );
        assert_eq!(ListingDate::from_timestamp("2026/01/13"), Some(d("20260113")));
        assert_eq!(ListingDate::from_timestamp("2026-01-13"), None);
        assert_eq!(ListingDate::from_timestamp("08:30"), None);
        assert_eq!(ListingDate::from_timestamp(""), None);
    }

    #[test]
    fn range_is_inclusive_and_crosses_year_end() {
        let dates = ListingDate::range(d("20251230"), d("20260102")).unwrap();
        let compact: Vec<String> = dates.iter().map(|d| d.compact()).collect();
        assert_eq!(compact, ["20251230", "20251231", "20260101", "20260102"]);
    }

    #[test]
    fn range_single_day() {
        let dates = ListingDate::range(d("20260101"), d("20260101")).unwrap();
        assert_eq!(dates.len(), 1);
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = ListingDate::range(d("20260102"), d("20260101")).unwrap_err();
        assert!(matches!(err, DateError::InvertedRange { .. }));
    }
}
