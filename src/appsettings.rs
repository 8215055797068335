use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Preview,
    Run,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScheduleSettings {
    Timer {
        countdown_secs: u64,
    },
    Alarm {
        hour: u8,
        minute: u8,
        #[serde(default)]
        days_of_week: Vec<u8>,
    },
    Calendar {
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        #[serde(default)]
        second: u8,
        #[serde(default)]
        repeat_months: Vec<u8>,
        #[serde(default)]
        repeat_days: Vec<u8>,
    },
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReminderSettings {
    pub title: String,
    #[serde(default)]
    pub snooze_times: u8,
    #[serde(default)]
    pub snooze_interval_secs: u64,
    #[serde(default = "default_ring_duration_secs")]
    pub ring_duration_secs: u64,
    pub schedule: ScheduleSettings,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub timezone: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,
    #[serde(default)]
    pub reminders: Vec<ReminderSettings>,
}

fn default_ring_duration_secs() -> u64 {
    reminder_clock::reminder::DEFAULT_RING_DURATION_SECS
}

fn default_preview_count() -> usize {
    5
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {e}", self.timezone))
    }
}
