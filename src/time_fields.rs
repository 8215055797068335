//! Conversions between broken-down local calendar fields and epoch milliseconds.
//!
//! Months and weekdays are one-based on the public surface (January = 1, Monday = 1 ..
//! Sunday = 7). The zero-based helpers exist for callers that store the C-style numbering.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Absolute epoch milliseconds.
pub type Timestamp = u64;

pub const MILLIS_PER_SECOND: u64 = 1000;
pub const MONTHS_PER_YEAR: u8 = 12;
pub const DAYS_PER_WEEK: u8 = 7;
pub const MAX_DAYS_OF_MONTH: u8 = 31;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeFields {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Monday = 1 .. Sunday = 7. Filled in when reading a timestamp, ignored when writing one.
    pub weekday: u8,
}

impl DateTimeFields {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let weekday = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())
            .map(|date| weekday_number(date.weekday()))
            .unwrap_or(0);

        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday,
        }
    }

    pub fn from_timestamp(timestamp: Timestamp, tz: Tz) -> Option<Self> {
        let local = timestamp_to_local(timestamp, tz)?;
        Self::from_naive(&local.naive_local())
    }

    pub fn from_naive(naive: &NaiveDateTime) -> Option<Self> {
        Some(Self {
            year: u16::try_from(naive.year()).ok()?,
            month: naive.month() as u8,
            day: naive.day() as u8,
            hour: naive.hour() as u8,
            minute: naive.minute() as u8,
            second: naive.second() as u8,
            weekday: weekday_number(naive.weekday()),
        })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())
    }

    pub fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), self.second.into())
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        Some(self.date()?.and_time(self.time()?))
    }

    pub fn to_timestamp(&self, tz: Tz) -> Option<Timestamp> {
        local_to_timestamp(&self.to_naive()?, tz)
    }
}

/// Resolves a local wall-clock reading in `tz` to epoch milliseconds.
///
/// Readings inside a DST gap move forward by the length of the gap; ambiguous readings take
/// the earlier instant. Non-positive results are rejected.
pub fn local_to_timestamp(naive: &NaiveDateTime, tz: Tz) -> Option<Timestamp> {
    let resolved = match tz.from_local_datetime(naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let before_gap = tz
                .from_local_datetime(&(*naive - TimeDelta::hours(3)))
                .earliest()?;
            let offset = before_gap.offset().fix().local_minus_utc();
            let utc = *naive - TimeDelta::seconds(offset.into());
            Utc.from_utc_datetime(&utc)
        }
    };

    let millis = resolved.timestamp_millis();
    if millis <= 0 {
        return None;
    }
    u64::try_from(millis).ok()
}

pub fn timestamp_to_local(timestamp: Timestamp, tz: Tz) -> Option<DateTime<Tz>> {
    let millis = i64::try_from(timestamp).ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&tz))
}

pub fn to_timestamp(instant: DateTime<Utc>) -> Option<Timestamp> {
    u64::try_from(instant.timestamp_millis()).ok()
}

/// `secs * 1000`, or `None` when it would overflow.
pub fn seconds_to_millis(secs: u64) -> Option<u64> {
    secs.checked_mul(MILLIS_PER_SECOND)
}

pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Gregorian length of `month` (1..=12) in `year`; 0 for an invalid month.
pub fn days_of_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn month_to_zero_based(month: u8) -> u8 {
    month.saturating_sub(1)
}

pub fn month_from_zero_based(month: u8) -> u8 {
    month.saturating_add(1)
}

pub fn weekday_number(weekday: Weekday) -> u8 {
    weekday.number_from_monday() as u8
}

pub fn weekday_from_number(day: u8) -> Option<Weekday> {
    match day {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}
