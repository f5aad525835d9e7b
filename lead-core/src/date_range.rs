//! Date range presets and period arithmetic
//!
//! Ranges are half-open `[from, to)` over local calendar days. All
//! arithmetic happens on [`NaiveDate`]; instants are only produced at the
//! edge by attaching local midnight in a caller-supplied time zone, so DST
//! transitions never shift a boundary by a day.

use crate::{Error, Result};
use chrono::{
    DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day counts offered as quick picks
pub const QUICK_PICK_DAYS: [u32; 4] = [7, 14, 30, 90];

/// Range preset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Preset {
    Today,
    Yesterday,
    /// `Nd`: the last N days plus today
    LastDays(u32),
    ThisMonth,
    LastMonth,
    All,
    Custom,
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "today" => Ok(Preset::Today),
            "yesterday" => Ok(Preset::Yesterday),
            "thisMonth" => Ok(Preset::ThisMonth),
            "lastMonth" => Ok(Preset::LastMonth),
            "all" => Ok(Preset::All),
            "custom" => Ok(Preset::Custom),
            other => other
                .strip_suffix('d')
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .map(Preset::LastDays)
                .ok_or_else(|| Error::InvalidPreset(other.to_string())),
        }
    }
}

impl TryFrom<String> for Preset {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Preset> for String {
    fn from(preset: Preset) -> Self {
        preset.to_string()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Today => write!(f, "today"),
            Preset::Yesterday => write!(f, "yesterday"),
            Preset::LastDays(n) => write!(f, "{}d", n),
            Preset::ThisMonth => write!(f, "thisMonth"),
            Preset::LastMonth => write!(f, "lastMonth"),
            Preset::All => write!(f, "all"),
            Preset::Custom => write!(f, "custom"),
        }
    }
}

/// Resolved range; `from`/`to` are `None` only for [`Preset::All`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub preset: Preset,
    pub from: Option<NaiveDate>,
    /// Exclusive end day
    pub to: Option<NaiveDate>,
    pub label: String,
    pub days: Option<i64>,
}

/// UTC instants bounding a resolved range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Window {
    /// `from`/`to` as the backend expects them (`2024-03-08T00:00:00.000Z`)
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("from".to_string(), self.from.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("to".to_string(), self.to.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ]
    }
}

impl DateRange {
    /// Resolve a preset relative to `today` (local calendar day)
    pub fn resolve(preset: Preset, today: NaiveDate) -> Result<Self> {
        let tomorrow = next_day(today)?;
        let (from, to, label) = match preset {
            Preset::Today => (today, tomorrow, "Today".to_string()),
            Preset::Yesterday => (shift_days(today, -1)?, today, "Yesterday".to_string()),
            Preset::LastDays(n) => (
                shift_days(today, -i64::from(n))?,
                tomorrow,
                format!("Last {} days", n),
            ),
            Preset::ThisMonth => (first_of_month(today)?, tomorrow, "This month".to_string()),
            Preset::LastMonth => {
                let this_month = first_of_month(today)?;
                (
                    first_of_month(shift_days(this_month, -1)?)?,
                    this_month,
                    "Last month".to_string(),
                )
            }
            Preset::All => return Ok(Self::all()),
            Preset::Custom => {
                return Err(Error::InvalidPreset(
                    "custom ranges are built from two picked dates".to_string(),
                ))
            }
        };

        let days = match preset {
            Preset::LastDays(n) => i64::from(n),
            _ => (to - from).num_days(),
        };

        Ok(Self {
            preset,
            from: Some(from),
            to: Some(to),
            label,
            days: Some(days),
        })
    }

    /// Re-resolve a relative preset against a new `today`. Custom and
    /// all-time ranges are fixed and come back unchanged.
    pub fn rebase(&self, today: NaiveDate) -> Result<Self> {
        match self.preset {
            Preset::Custom | Preset::All => Ok(self.clone()),
            preset => Self::resolve(preset, today),
        }
    }

    /// Unscoped range
    pub fn all() -> Self {
        Self {
            preset: Preset::All,
            from: None,
            to: None,
            label: "All time".to_string(),
            days: None,
        }
    }

    /// Range covering both picked days inclusive, in either click order
    pub fn custom(a: NaiveDate, b: NaiveDate) -> Result<Self> {
        let (first, last) = if a <= b { (a, b) } else { (b, a) };
        let to = next_day(last)?;
        Ok(Self {
            preset: Preset::Custom,
            from: Some(first),
            to: Some(to),
            label: custom_label(first, last),
            days: Some((to - first).num_days()),
        })
    }

    /// Length of the range in days, `None` for all time
    pub fn span_days(&self) -> Option<i64> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some((to - from).num_days()),
            _ => None,
        }
    }

    /// Instants at local midnight of each bound
    pub fn window<Tz: TimeZone>(&self, tz: &Tz) -> Option<Window> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some(Window {
                from: local_midnight(tz, from),
                to: local_midnight(tz, to),
            }),
            _ => None,
        }
    }

    /// Backend query pairs; empty for all time
    pub fn query_pairs<Tz: TimeZone>(&self, tz: &Tz) -> Vec<(String, String)> {
        self.window(tz)
            .map(|w| w.query_pairs())
            .unwrap_or_default()
    }

    /// Shift by `steps` whole spans (negative goes back). The end never
    /// passes tomorrow; a clamped range keeps its span.
    pub fn navigate(&self, steps: i32, today: NaiveDate) -> Result<Self> {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(Error::InvalidDateRange(
                    "cannot navigate an all-time range".to_string(),
                ))
            }
        };
        if steps == 0 {
            return Ok(self.clone());
        }

        let span = (to - from).num_days().max(1);
        let shift = span.checked_mul(i64::from(steps)).ok_or_else(|| {
            Error::InvalidDateRange(format!("cannot move {} spans of {} days", steps, span))
        })?;
        let tomorrow = next_day(today)?;

        let (mut from, mut to) = (shift_days(from, shift)?, shift_days(to, shift)?);
        if to > tomorrow {
            to = tomorrow;
            from = shift_days(tomorrow, -span)?;
        }

        Self::custom(from, shift_days(to, -1)?)
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| Error::InvalidDateRange(format!("no day after {}", date)))
}

/// `date` moved by `days` (negative goes back), failing outside the calendar
fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or_else(|| {
        Error::InvalidDateRange(format!("{} days from {} is out of range", days, date))
    })
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate> {
    date.with_day(1)
        .ok_or_else(|| Error::InvalidDateRange(format!("no first day for {}", date)))
}

fn custom_label(first: NaiveDate, last: NaiveDate) -> String {
    if first == last {
        first.format("%b %-d, %Y").to_string()
    } else if first.year() == last.year() {
        format!("{} – {}", first.format("%b %-d"), last.format("%b %-d, %Y"))
    } else {
        format!("{} – {}", first.format("%b %-d, %Y"), last.format("%b %-d, %Y"))
    }
}

/// Midnight of `date` in `tz`; a midnight skipped by DST falls to the first
/// valid local instant of the day
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hour| {
            tz.from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}
