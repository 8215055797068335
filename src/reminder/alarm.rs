use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    error::ReminderError,
    time_fields::{DAYS_PER_WEEK, Timestamp, local_to_timestamp, to_timestamp, weekday_number},
    unit_set::WeekdaySet,
};

use super::{ReminderSchedule, Snooze};

pub const MAX_HOUR: u8 = 23;
pub const MAX_MINUTE: u8 = 59;

/// Daily wall-clock alarm, optionally limited to a set of weekdays.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmState {
    hour: u8,
    minute: u8,
    repeat_days: WeekdaySet,
}

impl AlarmState {
    pub(super) fn new(hour: u8, minute: u8, days_of_week: &[u8]) -> Result<Self, ReminderError> {
        if hour > MAX_HOUR || minute > MAX_MINUTE {
            log::warn!("Rejecting alarm with time of day {hour}:{minute}");
            return Err(ReminderError::InvalidTimeOfDay { hour, minute });
        }

        let mut alarm = Self {
            hour,
            minute,
            repeat_days: WeekdaySet::default(),
        };
        alarm.set_weekdays(days_of_week);

        Ok(alarm)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn repeat_days(&self) -> WeekdaySet {
        self.repeat_days
    }

    pub fn set_repeat_days(&mut self, repeat_days: WeekdaySet) {
        self.repeat_days = repeat_days;
    }

    /// Repeat days in ascending order, Monday = 1 .. Sunday = 7.
    pub fn days_of_week(&self) -> Vec<u8> {
        self.repeat_days.values()
    }

    pub fn set_weekdays(&mut self, days: &[u8]) {
        self.update_weekdays(days, true);
    }

    pub fn clear_weekdays(&mut self, days: &[u8]) {
        self.update_weekdays(days, false);
    }

    fn update_weekdays(&mut self, days: &[u8], set: bool) {
        if days.is_empty() {
            return;
        }
        if days.len() > DAYS_PER_WEEK as usize {
            log::warn!(
                "Ignoring {} days of week, at most {DAYS_PER_WEEK} are allowed",
                days.len()
            );
            return;
        }

        for &day in days {
            let applied = if set {
                self.repeat_days.insert(day)
            } else {
                self.repeat_days.remove(day)
            };
            if !applied {
                log::warn!("Ignoring invalid day of week {day}");
            }
        }
    }

    /// Days from `today` until the next repeat day. `today` itself only counts when the
    /// alarm time has not passed yet.
    fn days_until_next_repeat(&self, today: u8, today_has_passed: bool) -> Option<u8> {
        let start = if today_has_passed { 1 } else { 0 };
        (start..=DAYS_PER_WEEK).find(|offset| {
            let day = (today - 1 + offset) % DAYS_PER_WEEK + 1;
            self.repeat_days.contains(day)
        })
    }
}

impl ReminderSchedule for AlarmState {
    fn is_repeating(&self, snooze: &Snooze) -> bool {
        !self.repeat_days.is_empty() || (snooze.interval_secs() > 0 && snooze.times() > 0)
    }

    fn has_repeat_pattern(&self) -> bool {
        !self.repeat_days.is_empty()
    }

    fn next_trigger(&self, now: DateTime<Utc>, tz: Tz, force: bool) -> Option<Timestamp> {
        let time = NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), 0)?;
        let today = now.with_timezone(&tz).date_naive();
        let target = local_to_timestamp(&today.and_time(time), tz)?;
        let has_passed = to_timestamp(now)? >= target;

        let days_ahead = if self.repeat_days.is_empty() {
            match (has_passed, force) {
                (false, _) => 0,
                (true, true) => 1,
                (true, false) => return None,
            }
        } else {
            self.days_until_next_repeat(weekday_number(today.weekday()), has_passed)?
        };

        if days_ahead == 0 {
            return Some(target);
        }
        let date = today.checked_add_days(Days::new(days_ahead.into()))?;
        local_to_timestamp(&date.and_time(time), tz)
    }
}
