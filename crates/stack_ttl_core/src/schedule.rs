use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("rate must be at least one minute")]
    ZeroRate,
    #[error("cron field '{field}' cannot be empty")]
    BlankCronField { field: &'static str },
}

/// Trigger schedule for the termination handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    Rate {
        minutes: u32,
    },
    Cron {
        minute: String,
        hour: String,
        day: String,
        month: String,
    },
}

impl Schedule {
    pub fn every_minutes(minutes: u32) -> Self {
        Self::Rate { minutes }
    }

    /// Renders the scheduler expression, e.g. `rate(30 minutes)` or
    /// `cron(*/1 * * * ? *)`. Day-of-week is left open since day-of-month is
    /// always given.
    pub fn expression(&self) -> Result<String, ScheduleError> {
        match self {
            Self::Rate { minutes: 0 } => Err(ScheduleError::ZeroRate),
            Self::Rate { minutes: 1 } => Ok("rate(1 minute)".to_string()),
            Self::Rate { minutes } => Ok(format!("rate({minutes} minutes)")),
            Self::Cron {
                minute,
                hour,
                day,
                month,
            } => {
                let minute = cron_field("minute", minute)?;
                let hour = cron_field("hour", hour)?;
                let day = cron_field("day", day)?;
                let month = cron_field("month", month)?;
                Ok(format!("cron({minute} {hour} {day} {month} ? *)"))
            }
        }
    }
}

fn cron_field<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ScheduleError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ScheduleError::BlankCronField { field });
    }
    Ok(value)
}
