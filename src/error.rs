use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("countdown of {0} seconds is out of range")]
    InvalidDuration(u64),

    #[error("time of day {hour:02}:{minute:02} is out of range")]
    InvalidTimeOfDay { hour: u8, minute: u8 },

    #[error("invalid calendar date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidDate {
        year: u32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    },

    #[error("no future date satisfies the reminder constraints")]
    NoQualifyingDate,
}
