//! Reminder requests and the shared fire / snooze / repeat / expire state machine.

mod alarm;
mod calendar;
mod timer;


pub use alarm::{AlarmState, MAX_HOUR, MAX_MINUTE};
pub use calendar::{CALENDAR_LOOKAHEAD_YEARS, CalendarState};
pub use timer::TimerState;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    clock::{BootClock, Clock},
    error::ReminderError,
    time_fields::{DateTimeFields, MILLIS_PER_SECOND, Timestamp, seconds_to_millis, timestamp_to_local},
};

/// Non-zero snooze intervals below this are raised to it.
pub const MIN_SNOOZE_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_RING_DURATION_SECS: u64 = 1;

/// Snooze policy and the per-cycle countdown of snoozes left. `remaining` never exceeds
/// `times`, including after deserialization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSnooze")]
pub struct Snooze {
    times: u8,
    remaining: u8,
    interval_secs: u64,
}

#[derive(Deserialize)]
struct StoredSnooze {
    times: u8,
    remaining: u8,
    interval_secs: u64,
}

impl From<StoredSnooze> for Snooze {
    fn from(stored: StoredSnooze) -> Self {
        if stored.remaining > stored.times {
            log::warn!(
                "Stored snooze countdown {} exceeds the limit {}, clamping",
                stored.remaining,
                stored.times
            );
        }
        Self {
            times: stored.times,
            remaining: stored.remaining.min(stored.times),
            interval_secs: stored.interval_secs,
        }
    }
}

impl Snooze {
    pub fn times(&self) -> u8 {
        self.times
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    fn interval_ms(&self) -> u64 {
        self.interval_secs.saturating_mul(MILLIS_PER_SECOND)
    }

    fn reset(&mut self) {
        self.remaining = self.times;
    }
}

/// What each reminder kind contributes to the shared state machine.
pub trait ReminderSchedule {
    fn is_repeating(&self, snooze: &Snooze) -> bool;

    /// Whether the kind recurs on its own calendar pattern, snoozing aside.
    fn has_repeat_pattern(&self) -> bool;

    /// Next qualifying trigger strictly after `now`, in the local time of `tz`.
    fn next_trigger(&self, now: DateTime<Utc>, tz: Tz, force_advance_if_past: bool) -> Option<Timestamp>;

    fn on_trigger_updated(&mut self, _trigger: Timestamp, _tz: Tz) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReminderKind {
    Timer(TimerState),
    Alarm(AlarmState),
    Calendar(CalendarState),
}

impl Default for ReminderKind {
    fn default() -> Self {
        ReminderKind::Timer(TimerState::default())
    }
}

impl ReminderKind {
    fn schedule(&self) -> &dyn ReminderSchedule {
        match self {
            ReminderKind::Timer(timer) => timer,
            ReminderKind::Alarm(alarm) => alarm,
            ReminderKind::Calendar(calendar) => calendar,
        }
    }

    fn schedule_mut(&mut self) -> &mut dyn ReminderSchedule {
        match self {
            ReminderKind::Timer(timer) => timer,
            ReminderKind::Alarm(alarm) => alarm,
            ReminderKind::Calendar(calendar) => calendar,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReminderKind::Timer(_) => "timer",
            ReminderKind::Alarm(_) => "alarm",
            ReminderKind::Calendar(_) => "calendar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    trigger_time_ms: Timestamp,
    snooze: Snooze,
    ring_duration_secs: u64,
    expired: bool,
    kind: ReminderKind,
}

impl Default for ReminderRequest {
    fn default() -> Self {
        Self {
            trigger_time_ms: 0,
            snooze: Snooze::default(),
            ring_duration_secs: DEFAULT_RING_DURATION_SECS,
            expired: false,
            kind: ReminderKind::default(),
        }
    }
}

impl ReminderRequest {
    pub fn timer(
        countdown_secs: u64,
        clock: &dyn Clock,
        boot_clock: &dyn BootClock,
    ) -> Result<Self, ReminderError> {
        let timer = TimerState::new(countdown_secs, boot_clock)?;
        let countdown_ms = TimerState::countdown_millis(countdown_secs)?;
        let trigger_time_ms = clock
            .now_ms()
            .and_then(|now| now.checked_add(countdown_ms))
            .ok_or(ReminderError::InvalidDuration(countdown_secs))?;

        Ok(Self {
            trigger_time_ms,
            kind: ReminderKind::Timer(timer),
            ..Self::default()
        })
    }

    pub fn alarm(
        hour: u8,
        minute: u8,
        days_of_week: &[u8],
        clock: &dyn Clock,
    ) -> Result<Self, ReminderError> {
        let alarm = AlarmState::new(hour, minute, days_of_week)?;
        Self::with_first_trigger(ReminderKind::Alarm(alarm), clock)
    }

    pub fn calendar(
        date_time: &DateTimeFields,
        repeat_months: &[u8],
        repeat_days: &[u8],
        clock: &dyn Clock,
    ) -> Result<Self, ReminderError> {
        let calendar = CalendarState::new(date_time, repeat_months, repeat_days)?;
        Self::with_first_trigger(ReminderKind::Calendar(calendar), clock)
    }

    fn with_first_trigger(kind: ReminderKind, clock: &dyn Clock) -> Result<Self, ReminderError> {
        let mut reminder = Self {
            kind,
            ..Self::default()
        };

        let tz = clock.timezone();
        let first = reminder
            .kind
            .schedule()
            .next_trigger(clock.now(), tz, true)
            .ok_or_else(|| {
                log::warn!("No first trigger time exists for the {} reminder", reminder.kind.name());
                ReminderError::NoQualifyingDate
            })?;
        reminder.update_trigger(first, tz);

        Ok(reminder)
    }

    pub fn kind(&self) -> &ReminderKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ReminderKind {
        &mut self.kind
    }

    pub fn as_timer(&self) -> Option<&TimerState> {
        match &self.kind {
            ReminderKind::Timer(timer) => Some(timer),
            _ => None,
        }
    }

    pub fn as_alarm(&self) -> Option<&AlarmState> {
        match &self.kind {
            ReminderKind::Alarm(alarm) => Some(alarm),
            _ => None,
        }
    }

    pub fn as_alarm_mut(&mut self) -> Option<&mut AlarmState> {
        match &mut self.kind {
            ReminderKind::Alarm(alarm) => Some(alarm),
            _ => None,
        }
    }

    pub fn as_calendar(&self) -> Option<&CalendarState> {
        match &self.kind {
            ReminderKind::Calendar(calendar) => Some(calendar),
            _ => None,
        }
    }

    pub fn as_calendar_mut(&mut self) -> Option<&mut CalendarState> {
        match &mut self.kind {
            ReminderKind::Calendar(calendar) => Some(calendar),
            _ => None,
        }
    }

    pub fn trigger_time_ms(&self) -> Timestamp {
        self.trigger_time_ms
    }

    pub fn set_trigger_time_ms(&mut self, trigger_time_ms: Timestamp) {
        self.trigger_time_ms = trigger_time_ms;
    }

    pub fn trigger_time_local(&self, tz: Tz) -> Option<DateTime<Tz>> {
        timestamp_to_local(self.trigger_time_ms, tz)
    }

    pub fn snooze_times(&self) -> u8 {
        self.snooze.times
    }

    /// Sets the snooze limit and restarts the current cycle's countdown.
    pub fn set_snooze_times(&mut self, times: u8) {
        self.snooze.times = times;
        self.snooze.remaining = times;
    }

    pub fn snooze_times_remaining(&self) -> u8 {
        self.snooze.remaining
    }

    pub fn set_snooze_times_remaining(&mut self, remaining: u8) {
        self.snooze.remaining = remaining.min(self.snooze.times);
    }

    pub fn time_interval_secs(&self) -> u64 {
        self.snooze.interval_secs
    }

    /// 0 disables snoozing. Other values are raised to [`MIN_SNOOZE_INTERVAL_SECS`]; values
    /// that overflow millisecond conversion disable snoozing.
    pub fn set_time_interval_secs(&mut self, secs: u64) {
        self.snooze.interval_secs = if secs >= u64::MAX / MILLIS_PER_SECOND {
            log::warn!("Snooze interval of {secs}s is out of range, disabling snooze");
            0
        } else if secs > 0 && secs < MIN_SNOOZE_INTERVAL_SECS {
            MIN_SNOOZE_INTERVAL_SECS
        } else {
            secs
        };
    }

    pub fn ring_duration_secs(&self) -> u64 {
        self.ring_duration_secs
    }

    pub fn set_ring_duration_secs(&mut self, secs: u64) {
        self.ring_duration_secs = match seconds_to_millis(secs) {
            Some(_) if secs > 0 => secs,
            _ => DEFAULT_RING_DURATION_SECS,
        };
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn set_expired(&mut self, expired: bool) {
        self.expired = expired;
    }

    pub fn is_repeating(&self) -> bool {
        self.kind.schedule().is_repeating(&self.snooze)
    }

    /// Moves the reminder past a firing. Returns false once it has expired.
    pub fn advance(&mut self, clock: &dyn Clock) -> bool {
        if self.expired {
            return false;
        }

        if !self.is_repeating() {
            self.snooze.reset();
            self.expire();
            return false;
        }

        if self.snooze.remaining > 0 && self.snooze.interval_secs > 0 {
            let snoozed = self.trigger_time_ms.saturating_add(self.snooze.interval_ms());
            self.update_trigger(snoozed, clock.timezone());
            self.snooze.remaining -= 1;
            log::debug!(
                "Snoozed {} reminder to {}, {} snoozes left",
                self.kind.name(),
                self.trigger_time_ms,
                self.snooze.remaining
            );
            return true;
        }

        self.snooze.reset();
        let tz = clock.timezone();
        let reference = self.advance_reference(clock.now());
        match self.next_occurrence(false, true, reference, tz) {
            Some(next) => {
                self.update_trigger(next, tz);
                log::debug!("Repeating {} reminder at {next}", self.kind.name());
                true
            }
            None => {
                self.expire();
                false
            }
        }
    }

    /// Next trigger the reminder would take on a repeat, without touching any state.
    pub fn peek_next_ignoring_snooze(
        &self,
        ignore_repeat_flag: bool,
        force_advance_if_past: bool,
        clock: &dyn Clock,
    ) -> Option<Timestamp> {
        self.next_occurrence(ignore_repeat_flag, force_advance_if_past, clock.now(), clock.timezone())
    }

    /// Manual snooze: fire again one interval from now. No-op once expired or when snoozing is
    /// disabled.
    pub fn snooze(&mut self, clock: &dyn Clock) -> bool {
        if self.expired || self.snooze.interval_secs == 0 {
            return false;
        }
        let Some(now) = clock.now_ms() else {
            return false;
        };

        self.update_trigger(now.saturating_add(self.snooze.interval_ms()), clock.timezone());
        self.snooze.reset();
        true
    }

    pub fn should_show_immediately(&self, clock: &dyn Clock) -> bool {
        clock
            .now_ms()
            .is_some_and(|now| self.trigger_time_ms <= now)
    }

    /// Handles a user edit of the wall clock. Returns true when the reminder became due and
    /// should be shown right away.
    pub fn on_date_time_change(&mut self, clock: &dyn Clock, boot_clock: &dyn BootClock) -> bool {
        if let ReminderKind::Timer(_) = self.kind {
            self.reanchor_timer(clock, boot_clock, "date/time change");
            return false;
        }
        if self.expired {
            return false;
        }
        let Some(now) = clock.now_ms() else {
            return false;
        };
        if self.trigger_time_ms == 0 {
            return false;
        }

        let tz = clock.timezone();
        match self.peek_next_ignoring_snooze(true, false, clock) {
            Some(next) if next <= self.trigger_time_ms => {
                self.update_trigger(next, tz);
                self.snooze.reset();
                false
            }
            _ => self.trigger_time_ms <= now,
        }
    }

    /// Handles a switch from `old_timezone` to the clock's current zone. Returns true when the
    /// reminder became due and should be shown right away.
    pub fn on_time_zone_change(
        &mut self,
        old_timezone: Tz,
        clock: &dyn Clock,
        boot_clock: &dyn BootClock,
    ) -> bool {
        if let ReminderKind::Timer(_) = self.kind {
            self.reanchor_timer(clock, boot_clock, "timezone change");
            return false;
        }
        if self.expired {
            return false;
        }

        let tz = clock.timezone();
        let Some(new_zone_trigger) = DateTimeFields::from_timestamp(self.trigger_time_ms, old_timezone)
            .and_then(|fields| fields.to_timestamp(tz))
        else {
            return false;
        };
        let next = self.peek_next_ignoring_snooze(true, false, clock);

        match next {
            Some(next) if self.trigger_time_ms < new_zone_trigger => {
                self.update_trigger(next, tz);
                self.snooze.reset();
                false
            }
            _ => {
                let Some(now) = clock.now_ms() else {
                    return false;
                };
                if new_zone_trigger <= now {
                    self.snooze.reset();
                    true
                } else {
                    self.update_trigger(new_zone_trigger, tz);
                    false
                }
            }
        }
    }

    fn reanchor_timer(&mut self, clock: &dyn Clock, boot_clock: &dyn BootClock, reason: &str) {
        if self.expired {
            return;
        }
        let Some(now) = clock.now_ms() else {
            return;
        };
        let ReminderKind::Timer(timer) = &mut self.kind else {
            return;
        };

        self.snooze.remaining = 0;
        if let Some(trigger) = timer.reanchor(now, boot_clock) {
            log::debug!(
                "Timer re-anchored after {reason}: {} -> {trigger}",
                self.trigger_time_ms
            );
            self.trigger_time_ms = trigger;
        }
    }

    fn next_occurrence(
        &self,
        ignore_repeat_flag: bool,
        force_advance_if_past: bool,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Option<Timestamp> {
        let schedule = self.kind.schedule();
        if ignore_repeat_flag || schedule.has_repeat_pattern() {
            schedule.next_trigger(now, tz, force_advance_if_past)
        } else {
            None
        }
    }

    /// Repeats are looked up after the later of now and the current trigger, so advancing a
    /// reminder before it fires never yields the same trigger again.
    fn advance_reference(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.trigger_time_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map_or(now, |trigger| trigger.max(now))
    }

    fn update_trigger(&mut self, trigger: Timestamp, tz: Tz) {
        self.trigger_time_ms = trigger;
        self.kind.schedule_mut().on_trigger_updated(trigger, tz);
    }

    fn expire(&mut self) {
        self.expired = true;
        log::info!("{} reminder expired", self.kind.name());
    }
}
