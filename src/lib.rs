//! Computes when reminders fire next: countdown timers, weekday alarms and calendar
//! reminders, with shared snooze and expiry handling and recovery from wall clock and
//! timezone changes.
//!
//! Everything here is synchronous and free of I/O. The current time is always injected
//! through [`Clock`] and [`BootClock`].

pub mod clock;
pub mod error;
pub mod reminder;
pub mod time_fields;
pub mod unit_set;

pub use clock::{BootClock, Clock, ManualBootClock, ManualClock, MonotonicBootClock, SystemClock};
pub use error::ReminderError;
pub use reminder::{
    AlarmState, CalendarState, ReminderKind, ReminderRequest, ReminderSchedule, Snooze, TimerState,
};
pub use time_fields::{DateTimeFields, Timestamp, days_of_month};
