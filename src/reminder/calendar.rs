use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    error::ReminderError,
    time_fields::{
        DateTimeFields, MAX_DAYS_OF_MONTH, MONTHS_PER_YEAR, Timestamp, days_of_month,
        local_to_timestamp, to_timestamp,
    },
    unit_set::{DaySet, MonthSet},
};

use super::{ReminderSchedule, Snooze};

/// Upper bound of the forward walk looking for a qualifying repeat date. Eight years covers
/// a Feb 29 constraint across a skipped century leap year.
pub const CALENDAR_LOOKAHEAD_YEARS: u32 = 8;

/// A specific date and time, optionally repeated on a set of months and/or days of month.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarState {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    first_designate_year: u16,
    first_designate_month: u8,
    first_designate_day: u8,
    repeat_months: MonthSet,
    repeat_days: DaySet,
}

impl CalendarState {
    pub(super) fn new(
        date_time: &DateTimeFields,
        repeat_months: &[u8],
        repeat_days: &[u8],
    ) -> Result<Self, ReminderError> {
        Self::validate(date_time)?;

        let mut calendar = Self {
            year: date_time.year,
            month: date_time.month,
            day: date_time.day,
            hour: date_time.hour,
            minute: date_time.minute,
            second: date_time.second,
            first_designate_year: date_time.year,
            first_designate_month: date_time.month,
            first_designate_day: date_time.day,
            repeat_months: MonthSet::default(),
            repeat_days: DaySet::default(),
        };
        calendar.set_repeat_months(repeat_months);
        calendar.set_repeat_days_of_month(repeat_days);

        Ok(calendar)
    }

    fn validate(fields: &DateTimeFields) -> Result<(), ReminderError> {
        let in_range = (1..=MONTHS_PER_YEAR).contains(&fields.month)
            && (1..=days_of_month(fields.year, fields.month)).contains(&fields.day)
            && fields.hour <= 23
            && fields.minute <= 59
            && fields.second <= 59;

        if in_range {
            Ok(())
        } else {
            Err(ReminderError::InvalidDate {
                year: fields.year.into(),
                month: fields.month,
                day: fields.day,
                hour: fields.hour,
                minute: fields.minute,
                second: fields.second,
            })
        }
    }

    pub fn set_repeat_months(&mut self, months: &[u8]) {
        if months.len() > MONTHS_PER_YEAR as usize {
            log::warn!("Ignoring {} repeat months, at most {MONTHS_PER_YEAR} are allowed", months.len());
            return;
        }
        for &month in months {
            if !self.repeat_months.insert(month) {
                log::warn!("Ignoring invalid repeat month {month}");
            }
        }
    }

    pub fn set_repeat_days_of_month(&mut self, days: &[u8]) {
        if days.len() > MAX_DAYS_OF_MONTH as usize {
            log::warn!("Ignoring {} repeat days, at most {MAX_DAYS_OF_MONTH} are allowed", days.len());
            return;
        }
        for &day in days {
            if !self.repeat_days.insert(day) {
                log::warn!("Ignoring invalid repeat day of month {day}");
            }
        }
    }

    /// Date of the active trigger, with the configured time of day.
    pub fn date_time(&self) -> DateTimeFields {
        DateTimeFields::new(self.year, self.month, self.day, self.hour, self.minute, self.second)
    }

    /// The date originally requested, unaffected by later repeats.
    pub fn first_designate_date_time(&self) -> DateTimeFields {
        DateTimeFields::new(
            self.first_designate_year,
            self.first_designate_month,
            self.first_designate_day,
            self.hour,
            self.minute,
            self.second,
        )
    }

    pub fn repeat_months(&self) -> Vec<u8> {
        self.repeat_months.values()
    }

    pub fn repeat_days_of_month(&self) -> Vec<u8> {
        self.repeat_days.values()
    }

    pub fn repeat_months_mask(&self) -> MonthSet {
        self.repeat_months
    }

    pub fn repeat_days_mask(&self) -> DaySet {
        self.repeat_days
    }

    pub fn set_repeat_months_mask(&mut self, months: MonthSet) {
        self.repeat_months = months;
    }

    pub fn set_repeat_days_mask(&mut self, days: DaySet) {
        self.repeat_days = days;
    }

    fn matches(&self, date: NaiveDate) -> bool {
        let month_ok = self.repeat_months.is_empty() || self.repeat_months.contains(date.month() as u8);
        let day_ok = self.repeat_days.is_empty() || self.repeat_days.contains(date.day() as u8);
        month_ok && day_ok
    }

    fn first_designate_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.first_designate_year.into(),
            self.first_designate_month.into(),
            self.first_designate_day.into(),
        )
    }
}

impl ReminderSchedule for CalendarState {
    fn is_repeating(&self, _snooze: &Snooze) -> bool {
        self.has_repeat_pattern()
    }

    fn has_repeat_pattern(&self) -> bool {
        !self.repeat_months.is_empty() || !self.repeat_days.is_empty()
    }

    fn next_trigger(&self, now: DateTime<Utc>, tz: Tz, _force: bool) -> Option<Timestamp> {
        let first = self.first_designate_date()?;
        let time = NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), self.second.into())?;
        let now_ms = to_timestamp(now)?;

        if !self.has_repeat_pattern() {
            let target = local_to_timestamp(&first.and_time(time), tz)?;
            return (now_ms < target).then_some(target);
        }

        let mut date = now.with_timezone(&tz).date_naive().max(first);
        for _ in 0..CALENDAR_LOOKAHEAD_YEARS * 366 {
            if self.matches(date) {
                if let Some(target) = local_to_timestamp(&date.and_time(time), tz) {
                    if target > now_ms {
                        return Some(target);
                    }
                }
            }
            date = date.succ_opt()?;
        }

        log::debug!(
            "No date within {CALENDAR_LOOKAHEAD_YEARS} years matches months {:?} and days {:?}",
            self.repeat_months(),
            self.repeat_days_of_month()
        );
        None
    }

    fn on_trigger_updated(&mut self, trigger: Timestamp, tz: Tz) {
        if let Some(fields) = DateTimeFields::from_timestamp(trigger, tz) {
            self.year = fields.year;
            self.month = fields.month;
            self.day = fields.day;
        }
    }
}
