//! Business-calendar arithmetic.
//!
//! Two families of operations: whole-business-day walking (weekend-skipping
//! day counts) and intraday walking (hour-precision inside a configured
//! work window). Both operate on naive local time; callers supply `now`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for floating-point hour comparisons.
const EPS: f64 = 1e-9;

/// Invalid work-window configuration.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("workday window must satisfy 0 <= start < end <= 23, got {start_hour}..{end_hour}")]
pub struct InvalidWorkday {
    pub start_hour: u32,
    pub end_hour: u32,
}

/// Daily work window, in whole hours of the local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workday {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Workday {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, InvalidWorkday> {
        if start_hour >= end_hour || end_hour > 23 {
            return Err(InvalidWorkday {
                start_hour,
                end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn hours_per_day(&self) -> f64 {
        (self.end_hour - self.start_hour) as f64
    }

    /// Convert a fractional-day estimate into work hours.
    pub fn days_to_hours(&self, days: f64) -> f64 {
        days * self.hours_per_day()
    }
}

impl Default for Workday {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 16,
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Roll a weekend date forward to the following Monday; weekdays pass through.
pub fn roll_to_monday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Advance `start` by a running total of business days, skipping weekends.
///
/// The total may be fractional; any fraction consumes a whole extra business
/// day. A zero total only applies the weekend-to-Monday roll. The result
/// never lands on a Saturday or Sunday.
pub fn add_business_days(start: NaiveDate, business_days: f64) -> NaiveDate {
    let mut current = start;
    let mut added = 0u64;
    while (added as f64) < business_days {
        current += Duration::days(1);
        if !is_weekend(current) {
            added += 1;
        }
    }
    roll_to_monday(current)
}

/// Fractional hour-of-day of a timestamp.
fn hour_of(dt: NaiveDateTime) -> f64 {
    dt.hour() as f64
        + dt.minute() as f64 / 60.0
        + dt.second() as f64 / 3600.0
        + dt.nanosecond() as f64 / 3_600_000_000_000.0
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0)
        .expect("workday hour validated to be in range")
}

/// Start of the next business day after `dt`.
fn next_business_start(dt: NaiveDateTime, start_hour: u32) -> NaiveDateTime {
    let mut date = dt.date() + Duration::days(1);
    while is_weekend(date) {
        date += Duration::days(1);
    }
    at_hour(date, start_hour)
}

/// Normalize a cursor into the work window: weekends jump to the next
/// Monday's start, pre-window times snap to the day's start, and post-window
/// times jump to the next business day's start.
fn normalize_into_window(cursor: NaiveDateTime, workday: Workday) -> NaiveDateTime {
    if is_weekend(cursor.date()) {
        let mut date = cursor.date();
        while is_weekend(date) {
            date += Duration::days(1);
        }
        return at_hour(date, workday.start_hour);
    }
    let cur = hour_of(cursor);
    if cur < workday.start_hour as f64 {
        return at_hour(cursor.date(), workday.start_hour);
    }
    if cur >= workday.end_hour as f64 {
        return next_business_start(cursor, workday.start_hour);
    }
    cursor
}

fn duration_from_hours(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Round up to the next whole minute; exact minutes are unchanged.
fn round_up_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    let truncated = dt
        .date()
        .and_hms_opt(dt.hour(), dt.minute(), 0)
        .expect("truncating to minute preserves a valid time");
    if dt > truncated {
        truncated + Duration::minutes(1)
    } else {
        truncated
    }
}

/// Walk forward from `start`, consuming `hours` of work-window time.
///
/// Weekends are skipped and each day contributes at most
/// `end_hour - start_hour` hours. When the remaining work fits in the
/// current day it finishes there, with one boundary rule: work that ends
/// exactly at the window's end hour, having not begun exactly at the
/// window's start hour, rolls to the next business day's start. The result
/// is rounded up to the next whole minute.
pub fn add_business_hours(start: NaiveDateTime, hours: f64, workday: Workday) -> NaiveDateTime {
    let end = workday.end_hour as f64;
    let day_start = workday.start_hour as f64;

    let mut remaining = hours;
    let mut cursor = normalize_into_window(start, workday);

    let mut started_at_day_start = false;
    let mut ended_same_day = false;

    while remaining > 0.0 {
        cursor = normalize_into_window(cursor, workday);

        let available = end - hour_of(cursor);
        if remaining <= available + EPS {
            let before = hour_of(cursor);
            cursor += duration_from_hours(remaining);
            let after = hour_of(cursor);
            started_at_day_start = (before - day_start).abs() < EPS;
            ended_same_day = true;
            let finished_at_end = (after - end).abs() < EPS;
            if finished_at_end && !started_at_day_start {
                cursor = next_business_start(cursor, workday.start_hour);
            }
            remaining = 0.0;
        } else {
            cursor += duration_from_hours(available);
            remaining -= available;
            cursor = next_business_start(cursor, workday.start_hour);
        }
    }

    cursor = round_up_to_minute(cursor);

    // Minute rounding can push a same-day finish past the window's end.
    if ended_same_day && !started_at_day_start && hour_of(cursor) >= end {
        cursor = next_business_start(cursor, workday.start_hour);
    }

    cursor
}
