mod appsettings;
mod driver;
mod planner;

use appsettings::{AppSettings, Mode};
use chrono::Utc;
use chrono_tz::Tz;
use driver::{ReminderDriver, ScheduledReminder};
use reminder_clock::{MonotonicBootClock, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    let timezone = settings.timezone()?;
    log::info!(
        "Loaded {} reminders, timezone {timezone}, mode {:?}",
        settings.reminders.len(),
        settings.mode
    );

    match settings.mode {
        Mode::Preview => preview(&settings, timezone),
        Mode::Run => run(&settings, timezone).await,
    }
}

fn preview(settings: &AppSettings, timezone: Tz) -> anyhow::Result<()> {
    let now = Utc::now();
    for reminder in &settings.reminders {
        match planner::preview(reminder, now, timezone, settings.preview_count) {
            Ok(firings) => {
                log::info!("'{}' fires {} times:", reminder.title, firings.len());
                for at in firings {
                    log::info!("  {}", at.format("%a %Y-%m-%d %H:%M:%S %Z"));
                }
            }
            Err(e) => log::warn!("'{}' cannot be scheduled: {e}", reminder.title),
        }
    }

    Ok(())
}

async fn run(settings: &AppSettings, timezone: Tz) -> anyhow::Result<()> {
    let clock = SystemClock::new(timezone);
    let boot_clock = MonotonicBootClock;

    let mut scheduled = Vec::with_capacity(settings.reminders.len());
    for reminder_settings in &settings.reminders {
        match planner::build_reminder(reminder_settings, &clock, &boot_clock) {
            Ok(reminder) => {
                log::info!(
                    "Scheduled '{}' at {:?}",
                    reminder_settings.title,
                    reminder.trigger_time_local(timezone)
                );
                scheduled.push(ScheduledReminder {
                    title: reminder_settings.title.clone(),
                    reminder,
                });
            }
            Err(e) => log::warn!("Skipping '{}': {e}", reminder_settings.title),
        }
    }

    let task = ReminderDriver::start(scheduled, clock, boot_clock);
    let cancellation_token = task.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation_token.cancel();
        }
    });

    let remaining = task.join().await?;
    log::info!("Stopped with {} live reminders", remaining.len());

    Ok(())
}
