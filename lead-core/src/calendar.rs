//! Month grid and two-click range picker

use crate::date_range::DateRange;
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// One selectable day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub is_today: bool,
    /// Future days cannot be picked
    pub disabled: bool,
    pub is_start: bool,
    pub is_end: bool,
    pub in_range: bool,
}

/// Monday-first month grid; `None` cells pad the first and last week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub weekdays: [&'static str; 7],
    pub weeks: Vec<[Option<DayCell>; 7]>,
}

/// Build the grid for `year`/`month`, highlighting a (possibly pending)
/// selection
pub fn month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidDateRange(format!("no such month: {}-{}", year, month)))?;
    let lead_blanks = first.weekday().num_days_from_monday() as usize;

    let (low, high) = match (start, end) {
        (Some(a), Some(b)) if b < a => (Some(b), Some(a)),
        other => other,
    };

    let mut cells: Vec<Option<DayCell>> = vec![None; lead_blanks];
    let mut date = first;
    while date.month() == month {
        cells.push(Some(DayCell {
            date,
            day: date.day(),
            is_today: date == today,
            disabled: date > today,
            is_start: Some(date) == low,
            is_end: Some(date) == high,
            in_range: matches!((low, high), (Some(l), Some(h)) if date >= l && date <= h),
        }));
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    let weeks = cells
        .chunks(7)
        .map(|week| std::array::from_fn(|i| week[i].clone()))
        .collect();

    Ok(MonthGrid {
        year,
        month,
        title: first.format("%B %Y").to_string(),
        weekdays: WEEKDAYS,
        weeks,
    })
}

/// Custom-range picker state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarPicker {
    open: bool,
    year: i32,
    month: u32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl CalendarPicker {
    /// Closed picker showing the month of `today`
    pub fn new(today: NaiveDate) -> Self {
        Self::at(today.year(), today.month())
    }

    /// Closed picker showing an arbitrary month
    pub fn at(year: i32, month: u32) -> Self {
        Self {
            open: false,
            year,
            month,
            start: None,
            end: None,
        }
    }

    /// Restore a selection, e.g. from query parameters
    pub fn with_selection(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end.filter(|_| start.is_some());
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn selection(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.start, self.end)
    }

    pub fn prev_month(&mut self) {
        if self.month == 1 {
            self.month = 12;
            self.year -= 1;
        } else {
            self.month -= 1;
        }
    }

    pub fn next_month(&mut self) {
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }

    /// Handle a click on `date`.
    ///
    /// The first click sets a pending start and clears any previous end.
    /// The second click completes the range and closes the picker. Future
    /// days are ignored.
    pub fn click(&mut self, date: NaiveDate, today: NaiveDate) -> Result<Option<DateRange>> {
        if date > today {
            return Ok(None);
        }
        match (self.start, self.end) {
            (Some(start), None) => {
                let range = DateRange::custom(start, date)?;
                self.start = range.from;
                self.end = Some(if date < start { start } else { date });
                self.open = false;
                Ok(Some(range))
            }
            _ => {
                self.start = Some(date);
                self.end = None;
                Ok(None)
            }
        }
    }

    /// Grid of the currently shown month
    pub fn grid(&self, today: NaiveDate) -> Result<MonthGrid> {
        month_grid(self.year, self.month, today, self.start, self.end)
    }
}
