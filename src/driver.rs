use std::time::Duration;

use reminder_clock::{BootClock, Clock, ReminderRequest};
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

/// Longest single sleep, so wall clock jumps are noticed even while waiting for a far trigger.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Wall clock drift against the boot clock that counts as a user clock change.
const CLOCK_JUMP_THRESHOLD_MS: i64 = 1000;

#[derive(Debug, Clone)]
pub struct ScheduledReminder {
    pub title: String,
    pub reminder: ReminderRequest,
}

pub struct DriverTask {
    task_handle: JoinHandle<Vec<ScheduledReminder>>,
    cancellation_token: CancellationToken,
}

impl DriverTask {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Waits for the driver to stop and hands back the reminders still alive.
    pub async fn join(self) -> anyhow::Result<Vec<ScheduledReminder>> {
        Ok(self.task_handle.await?)
    }
}

pub struct ReminderDriver;

impl ReminderDriver {
    pub fn start<C, B>(reminders: Vec<ScheduledReminder>, clock: C, boot_clock: B) -> DriverTask
    where
        C: Clock + Send + Sync + 'static,
        B: BootClock + Send + Sync + 'static,
    {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let task_handle = tokio::spawn(async move {
            Self::run(task_cancellation_token, reminders, &clock, &boot_clock).await
        });

        DriverTask {
            task_handle,
            cancellation_token,
        }
    }

    async fn run<C, B>(
        cancellation_token: CancellationToken,
        mut reminders: Vec<ScheduledReminder>,
        clock: &C,
        boot_clock: &B,
    ) -> Vec<ScheduledReminder>
    where
        C: Clock + Sync,
        B: BootClock + Sync,
    {
        let mut last_seen = ClockReading::take(clock, boot_clock);

        loop {
            reminders.retain(|scheduled| !scheduled.reminder.is_expired());
            let Some(next_trigger) = reminders
                .iter()
                .map(|scheduled| scheduled.reminder.trigger_time_ms())
                .min()
            else {
                log::info!("No live reminders left, stopping");
                break;
            };

            let delay = get_target_delay(next_trigger, clock.now_ms().unwrap_or(0)).min(MAX_SLEEP);
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    log::info!("Reminder driver was cancelled");
                    break;
                },
                _ = time::sleep(delay) => {}
            }

            let reading = ClockReading::take(clock, boot_clock);
            if let Some(drift) = last_seen.drift_to(&reading) {
                if drift.abs() > CLOCK_JUMP_THRESHOLD_MS {
                    log::warn!("Wall clock jumped by {drift}ms, refreshing reminders");
                    Self::handle_clock_change(&mut reminders, clock, boot_clock);
                }
            }
            last_seen = reading;

            for scheduled in reminders
                .iter_mut()
                .filter(|scheduled| scheduled.reminder.should_show_immediately(clock))
            {
                Self::fire(scheduled, clock);
            }
        }

        reminders
    }

    fn handle_clock_change(
        reminders: &mut [ScheduledReminder],
        clock: &dyn Clock,
        boot_clock: &dyn BootClock,
    ) {
        for scheduled in reminders.iter_mut() {
            if scheduled.reminder.on_date_time_change(clock, boot_clock) {
                log::info!("'{}' became due after the clock change", scheduled.title);
            }
        }
    }

    fn fire(scheduled: &mut ScheduledReminder, clock: &dyn Clock) {
        let tz = clock.timezone();
        log::info!(
            "[FIRED] '{}' due at {:?}, ringing for {}s",
            scheduled.title,
            scheduled.reminder.trigger_time_local(tz),
            scheduled.reminder.ring_duration_secs()
        );

        if scheduled.reminder.advance(clock) {
            log::info!(
                "[NEXT] '{}' at {:?}, {} snoozes left",
                scheduled.title,
                scheduled.reminder.trigger_time_local(tz),
                scheduled.reminder.snooze_times_remaining()
            );
        } else {
            log::info!("[EXPIRED] '{}'", scheduled.title);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClockReading {
    wall_ms: Option<u64>,
    boot_ms: Option<u64>,
}

impl ClockReading {
    fn take(clock: &dyn Clock, boot_clock: &dyn BootClock) -> Self {
        Self {
            wall_ms: clock.now_ms(),
            boot_ms: boot_clock.now_ms(),
        }
    }

    /// Wall clock progress minus boot clock progress since `self`.
    fn drift_to(&self, later: &ClockReading) -> Option<i64> {
        let wall = i64::try_from(later.wall_ms?).ok()? - i64::try_from(self.wall_ms?).ok()?;
        let boot = i64::try_from(later.boot_ms?).ok()? - i64::try_from(self.boot_ms?).ok()?;
        Some(wall - boot)
    }
}

pub(crate) fn get_target_delay(trigger_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(trigger_ms.saturating_sub(now_ms))
}
