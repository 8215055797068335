use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reminder_clock::{
    BootClock, Clock, DateTimeFields, ManualBootClock, ManualClock, ReminderError, ReminderRequest,
};

use crate::appsettings::{ReminderSettings, ScheduleSettings};

pub fn build_reminder(
    settings: &ReminderSettings,
    clock: &dyn Clock,
    boot_clock: &dyn BootClock,
) -> Result<ReminderRequest, ReminderError> {
    let mut reminder = match &settings.schedule {
        ScheduleSettings::Timer { countdown_secs } => {
            ReminderRequest::timer(*countdown_secs, clock, boot_clock)?
        }
        ScheduleSettings::Alarm {
            hour,
            minute,
            days_of_week,
        } => ReminderRequest::alarm(*hour, *minute, days_of_week, clock)?,
        ScheduleSettings::Calendar {
            year,
            month,
            day,
            hour,
            minute,
            second,
            repeat_months,
            repeat_days,
        } => {
            let date_time = DateTimeFields::new(*year, *month, *day, *hour, *minute, *second);
            ReminderRequest::calendar(&date_time, repeat_months, repeat_days, clock)?
        }
    };

    reminder.set_snooze_times(settings.snooze_times);
    reminder.set_time_interval_secs(settings.snooze_interval_secs);
    reminder.set_ring_duration_secs(settings.ring_duration_secs);

    Ok(reminder)
}

/// Simulates the reminder firing `count` times starting at `now`, advancing it after each
/// firing exactly as a live scheduler would.
pub fn preview(
    settings: &ReminderSettings,
    now: DateTime<Utc>,
    timezone: Tz,
    count: usize,
) -> Result<Vec<DateTime<Tz>>, ReminderError> {
    let mut clock = ManualClock::new(now, timezone);
    let boot_clock = ManualBootClock(Some(0));
    let mut reminder = build_reminder(settings, &clock, &boot_clock)?;

    let mut firings = Vec::with_capacity(count);
    while firings.len() < count && !reminder.is_expired() {
        let Some(at) = reminder.trigger_time_local(timezone) else {
            break;
        };
        firings.push(at);
        clock.set_now(at.with_timezone(&Utc));
        reminder.advance(&clock);
    }

    Ok(firings)
}
