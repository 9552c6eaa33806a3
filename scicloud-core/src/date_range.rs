//! Calendar views, date windows and "today".

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Day,
    #[default]
    Week,
}

impl CalendarView {
    /// Days moved by previous/next navigation.
    pub fn step_days(self) -> u64 {
        match self {
            CalendarView::Day => 1,
            CalendarView::Week => 7,
        }
    }

    /// Range fetched from the store when this view is active.
    /// Week view fetches the whole month to cover neighbouring weeks.
    pub fn load_range(self, anchor: NaiveDate) -> DateRange {
        match self {
            CalendarView::Day => DateRange::day(anchor),
            CalendarView::Week => DateRange::month_of(anchor),
        }
    }

    /// Range shown on screen when this view is active.
    pub fn visible_range(self, anchor: NaiveDate) -> DateRange {
        match self {
            CalendarView::Day => DateRange::day(anchor),
            CalendarView::Week => DateRange::week_of(anchor),
        }
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CalendarView::Day => f.write_str("day"),
            CalendarView::Week => f.write_str("week"),
        }
    }
}

impl FromStr for CalendarView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(CalendarView::Day),
            "week" => Ok(CalendarView::Week),
            _ => Err(format!("Unknown view '{}'. Expected 'day' or 'week'", s)),
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let from = date - Days::new(date.weekday().num_days_from_monday() as u64);
        DateRange {
            from,
            to: from + Days::new(6),
        }
    }

    pub fn month_of(date: NaiveDate) -> Self {
        let from = date.with_day(1).unwrap_or(date);
        let to = (from + Months::new(1))
            .pred_opt()
            .unwrap_or(from);
        DateRange { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

/// Source of "today", optionally pinned to a time zone or a fixed date.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    tz: Option<Tz>,
    fixed: Option<NaiveDate>,
}

impl Clock {
    /// Today in the given zone, or the local zone if none.
    pub fn system(tz: Option<Tz>) -> Self {
        Clock { tz, fixed: None }
    }

    pub fn fixed(date: NaiveDate) -> Self {
        Clock {
            tz: None,
            fixed: Some(date),
        }
    }

    pub fn today(&self) -> NaiveDate {
        if let Some(date) = self.fixed {
            return date;
        }
        match self.tz {
            Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
            None => chrono::Local::now().date_naive(),
        }
    }
}
