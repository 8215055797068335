use std::{sync::OnceLock, time::Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Wall clock as seen by the reminder core. The timezone is part of the clock because
/// alarm and calendar reminders are defined in local time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn timezone(&self) -> Tz;

    fn now_ms(&self) -> Option<u64> {
        u64::try_from(self.now().timestamp_millis()).ok()
    }
}

/// Monotonic milliseconds that user edits of the wall clock cannot move.
pub trait BootClock {
    fn now_ms(&self) -> Option<u64>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Milliseconds elapsed since the first time any instance was queried in this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicBootClock;

impl BootClock for MonotonicBootClock {
    fn now_ms(&self) -> Option<u64> {
        static ANCHOR: OnceLock<Instant> = OnceLock::new();
        let anchor = ANCHOR.get_or_init(Instant::now);
        u64::try_from(anchor.elapsed().as_millis()).ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: DateTime<Utc>,
    timezone: Tz,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self { now, timezone }
    }

    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    pub fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }

    pub fn advance(&mut self, delta: chrono::TimeDelta) {
        self.now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ManualBootClock(pub Option<u64>);

impl ManualBootClock {
    pub fn advance_ms(&mut self, delta: u64) {
        self.0 = self.0.map(|ms| ms.saturating_add(delta));
    }
}

impl BootClock for ManualBootClock {
    fn now_ms(&self) -> Option<u64> {
        self.0
    }
}
