use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    clock::BootClock,
    error::ReminderError,
    time_fields::{MILLIS_PER_SECOND, Timestamp, seconds_to_millis},
};

use super::{ReminderSchedule, Snooze};

/// One-shot countdown. Keeps its deadline tied to elapsed boot time so that edits of the
/// wall clock do not stretch or shrink the countdown.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    countdown_secs: u64,
    first_boot_relative_ms: Option<u64>,
    when_to_change_sys_time_ms: u64,
}

impl TimerState {
    pub(super) fn new(countdown_secs: u64, boot_clock: &dyn BootClock) -> Result<Self, ReminderError> {
        Self::countdown_millis(countdown_secs)?;

        let first_boot_relative_ms = boot_clock.now_ms();
        if first_boot_relative_ms.is_none() {
            log::warn!(
                "Boot clock is unavailable, countdown of {countdown_secs}s will not survive wall clock changes"
            );
        }

        Ok(Self {
            countdown_secs,
            first_boot_relative_ms,
            when_to_change_sys_time_ms: 0,
        })
    }

    pub(super) fn countdown_millis(countdown_secs: u64) -> Result<u64, ReminderError> {
        if countdown_secs == 0 || countdown_secs >= u64::MAX / MILLIS_PER_SECOND {
            return Err(ReminderError::InvalidDuration(countdown_secs));
        }
        seconds_to_millis(countdown_secs).ok_or(ReminderError::InvalidDuration(countdown_secs))
    }

    pub fn countdown_secs(&self) -> u64 {
        self.countdown_secs
    }

    pub fn first_boot_relative_ms(&self) -> Option<u64> {
        self.first_boot_relative_ms
    }

    pub fn when_to_change_sys_time_ms(&self) -> u64 {
        self.when_to_change_sys_time_ms
    }

    pub fn set_first_boot_relative_ms(&mut self, ms: Option<u64>) {
        self.first_boot_relative_ms = ms;
    }

    pub fn set_when_to_change_sys_time_ms(&mut self, ms: u64) {
        self.when_to_change_sys_time_ms = ms;
    }

    /// Records the moment of a clock change and returns the re-anchored deadline:
    /// `change_time + countdown - (boot_now - first_boot)`.
    pub(super) fn reanchor(&mut self, now_ms: u64, boot_clock: &dyn BootClock) -> Option<Timestamp> {
        self.when_to_change_sys_time_ms = now_ms;

        let Some(first_boot) = self.first_boot_relative_ms else {
            log::warn!("Timer has no boot anchor, keeping its trigger time");
            return None;
        };
        let Some(boot_now) = boot_clock.now_ms() else {
            log::warn!("Boot clock is unavailable, keeping the timer trigger time");
            return None;
        };

        let countdown_ms = Self::countdown_millis(self.countdown_secs).ok()?;
        let elapsed = boot_now.saturating_sub(first_boot);

        Some(
            now_ms
                .saturating_add(countdown_ms)
                .saturating_sub(elapsed),
        )
    }
}

impl ReminderSchedule for TimerState {
    fn is_repeating(&self, _snooze: &Snooze) -> bool {
        false
    }

    fn has_repeat_pattern(&self) -> bool {
        false
    }

    fn next_trigger(&self, _now: DateTime<Utc>, _tz: Tz, _force: bool) -> Option<Timestamp> {
        None
    }
}
