use std::fmt;

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::{Error, Result};

/// A calendar date to pick, with the renderings the calendar widget uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDate {
    date: NaiveDate,
}

impl TargetDate {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// `today + weeks`, or `DateOutOfRange` past the last representable date.
    pub fn weeks_from(today: NaiveDate, weeks: u32) -> Result<Self> {
        today
            .checked_add_signed(Duration::weeks(i64::from(weeks)))
            .map(Self::new)
            .ok_or_else(|| Error::DateOutOfRange(format!("{} + {} week(s)", today, weeks)))
    }

    /// Local date plus `weeks`.
    pub fn weeks_from_now(weeks: u32) -> Result<Self> {
        Self::weeks_from(Local::now().date_naive(), weeks)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Day of month, as rendered in the day cell.
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Full English month name ("October").
    pub fn month_name(&self) -> String {
        self.date.format("%B").to_string()
    }

    /// `YYYY-MM-DD`, as used by `data-date` attributes.
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Signed day distance from `today`.
    pub fn days_from(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%-d %B %Y"))
    }
}
