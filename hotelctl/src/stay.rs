//! Validated night ranges.
//!
//! A stay is the half-open range of nights `[check_in, check_out)`. Quotes, holds, bookings and
//! availability checks all go through [`Stay::new`]; the ones that claim or report bookable
//! inventory also call [`Stay::ensure_not_past`]. Calendar and price-range reads use
//! [`DateRange`], which only bounds the span.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{Error, Result};

/// Longest span accepted by calendar and price-range queries, in days
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    /// Validates a stay lasting `1..=max_nights` nights.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate, max_nights: i64) -> Result<Self> {
        if check_in >= check_out {
            return Err(Error::invalid_field("check_out", "must be after check_in"));
        }
        let stay = Self { check_in, check_out };
        if stay.nights() > max_nights {
            return Err(Error::invalid_field(
                "check_out",
                format!("stays are limited to {max_nights} nights"),
            ));
        }
        Ok(stay)
    }

    pub fn ensure_not_past(self, today: NaiveDate) -> Result<Self> {
        if self.check_in < today {
            return Err(Error::invalid_field("check_in", "must not be in the past"));
        }
        Ok(self)
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Every night of the stay, in order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.check_in.iter_days().take_while({
            let end = self.check_out;
            move |d| *d < end
        })
    }
}

/// Inclusive date range for read-only calendar and pricing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::invalid_field("end_date", "must not be before start_date"));
        }
        if (end - start).num_days() >= MAX_RANGE_DAYS {
            return Err(Error::invalid_field(
                "end_date",
                format!("ranges are limited to {MAX_RANGE_DAYS} days"),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.start.iter_days().take(self.days() as usize)
    }

    /// Exclusive end, for occupancy queries that take half-open ranges
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_stay_nights_and_dates() {
        let stay = Stay::new(d(2030, 6, 1), d(2030, 6, 4), 30).unwrap();
        assert_eq!(stay.nights(), 3);
        assert_eq!(stay.dates().collect::<Vec<_>>(), vec![d(2030, 6, 1), d(2030, 6, 2), d(2030, 6, 3)]);
    }

    #[test]
    fn test_stay_rejects_bad_ranges() {
        let empty = Stay::new(d(2030, 6, 2), d(2030, 6, 2), 30).unwrap_err();
        assert!(matches!(empty, Error::ValidationFailed { ref fields, .. } if fields[0].field == "check_out"));

        assert!(Stay::new(d(2030, 6, 1), d(2030, 7, 2), 30).is_err());
        assert!(Stay::new(d(2030, 6, 1), d(2030, 7, 1), 30).is_ok());
    }

    #[test]
    fn test_stay_must_not_start_in_the_past() {
        let today = d(2030, 6, 1);
        let past = Stay::new(d(2030, 5, 31), d(2030, 6, 2), 30).unwrap().ensure_not_past(today).unwrap_err();
        assert!(matches!(past, Error::ValidationFailed { ref fields, .. } if fields[0].field == "check_in"));

        assert!(Stay::new(today, d(2030, 6, 2), 30).unwrap().ensure_not_past(today).is_ok());
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(d(2030, 6, 1), d(2030, 6, 1)).unwrap();
        assert_eq!(range.days(), 1);
        assert_eq!(range.end_exclusive(), d(2030, 6, 2));

        assert!(DateRange::new(d(2030, 6, 2), d(2030, 6, 1)).is_err());
        assert!(DateRange::new(d(2030, 1, 1), d(2030, 12, 31)).is_ok());
        assert!(DateRange::new(d(2030, 1, 1), d(2031, 1, 2)).is_err());
    }
}
