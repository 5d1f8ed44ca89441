//! Restart trigger variants and their firing-time computations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TriggerError {
    #[error("interval must be at least 1 second")]
    ZeroInterval,
    #[error("daily time {hour:02}:{minute:02} is out of range")]
    TimeOutOfRange { hour: u8, minute: u8 },
    #[error("daily time must be HH:MM, got {0:?}")]
    BadDailyTime(String),
    #[error("cron expression must have 5 fields (minute hour day month weekday), got {0}")]
    FieldCount(usize),
    #[error("invalid cron expression: {0}")]
    InvalidCron(String),
}

/// When a recurring restart fires.
///
/// `interval` counts from registration, `daily` and `cron` evaluate
/// wall-clock time in the configured timezone. Cron expressions use the
/// 5-field user form; the seconds column the job engine expects is added
/// internally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trigger {
    #[default]
    None,
    Interval {
        seconds: u64,
    },
    Daily {
        hour: u8,
        minute: u8,
    },
    Cron {
        expression: String,
    },
}

impl Trigger {
    /// Parse a wall-clock "HH:MM" string into a daily trigger.
    pub fn daily_from_hhmm(value: &str) -> Result<Self, TriggerError> {
        let (h, m) = value
            .split_once(':')
            .ok_or_else(|| TriggerError::BadDailyTime(value.to_string()))?;
        let hour = h
            .trim()
            .parse()
            .map_err(|_| TriggerError::BadDailyTime(value.to_string()))?;
        let minute = m
            .trim()
            .parse()
            .map_err(|_| TriggerError::BadDailyTime(value.to_string()))?;
        let trigger = Trigger::Daily { hour, minute };
        trigger.validate()?;
        Ok(trigger)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Trigger::None)
    }

    /// Reject malformed triggers before anything is armed.
    pub fn validate(&self) -> Result<(), TriggerError> {
        match self {
            Trigger::None => Ok(()),
            Trigger::Interval { seconds } => {
                if *seconds == 0 {
                    Err(TriggerError::ZeroInterval)
                } else {
                    Ok(())
                }
            }
            Trigger::Daily { hour, minute } => {
                if *hour > 23 || *minute > 59 {
                    Err(TriggerError::TimeOutOfRange {
                        hour: *hour,
                        minute: *minute,
                    })
                } else {
                    Ok(())
                }
            }
            Trigger::Cron { expression } => parse_cron(expression).map(|_| ()),
        }
    }

    /// Six-field form (with a leading seconds column) for the job engine.
    /// `None` for variants that do not schedule through cron.
    pub fn six_field_cron(&self) -> Option<String> {
        match self {
            Trigger::Daily { hour, minute } => Some(format!("0 {minute} {hour} * * *")),
            Trigger::Cron { expression } => Some(format!("0 {}", expression.trim())),
            _ => None,
        }
    }

    /// Next firing instant strictly after `from`, evaluated in `tz`
    /// (UTC when absent). `None` for an empty or malformed trigger.
    pub fn next_fire_at(&self, from: DateTime<Utc>, tz: Option<Tz>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::None => None,
            Trigger::Interval { seconds } => {
                let seconds = i64::try_from(*seconds).ok()?;
                from.checked_add_signed(Duration::seconds(seconds))
            }
            Trigger::Daily { .. } | Trigger::Cron { .. } => {
                let expression = self.six_field_cron()?;
                let schedule = Schedule::from_str(&expression).ok()?;
                next_schedule_fire(&schedule, from, tz)
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::None => write!(f, "none"),
            Trigger::Interval { seconds } => write!(f, "every {seconds}s"),
            Trigger::Daily { hour, minute } => write!(f, "daily at {hour:02}:{minute:02}"),
            Trigger::Cron { expression } => write!(f, "cron \"{expression}\""),
        }
    }
}

fn parse_cron(expression: &str) -> Result<Schedule, TriggerError> {
    let field_count = expression.split_whitespace().count();
    if field_count != 5 {
        return Err(TriggerError::FieldCount(field_count));
    }
    Schedule::from_str(&format!("0 {}", expression.trim()))
        .map_err(|e| TriggerError::InvalidCron(e.to_string()))
}

fn next_schedule_fire(
    schedule: &Schedule,
    from: DateTime<Utc>,
    tz: Option<Tz>,
) -> Option<DateTime<Utc>> {
    match tz {
        Some(tz) => {
            let local = from.with_timezone(&tz);
            schedule
                .after(&local)
                .next()
                .map(|next| next.with_timezone(&Utc))
        }
        None => schedule.after(&from).next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Timelike};

    #[test]
    fn test_trigger_json_shapes() {
        let none: Trigger = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(none, Trigger::None);

        let interval: Trigger = serde_json::from_str(r#"{"type":"interval","seconds":3600}"#).unwrap();
        assert_eq!(interval, Trigger::Interval { seconds: 3600 });

        let daily: Trigger = serde_json::from_str(r#"{"type":"daily","hour":3,"minute":0}"#).unwrap();
        assert_eq!(daily, Trigger::Daily { hour: 3, minute: 0 });

        let cron: Trigger =
            serde_json::from_str(r#"{"type":"cron","expression":"0 3 * * *"}"#).unwrap();
        assert_eq!(
            cron,
            Trigger::Cron {
                expression: "0 3 * * *".to_string()
            }
        );

        let json = serde_json::to_value(&daily).unwrap();
        assert_eq!(json["type"], "daily");
        assert_eq!(json["hour"], 3);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let err = Trigger::Interval { seconds: 0 }.validate().unwrap_err();
        assert_eq!(err, TriggerError::ZeroInterval);
        assert!(Trigger::Interval { seconds: 1 }.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_daily() {
        assert!(Trigger::Daily { hour: 24, minute: 0 }.validate().is_err());
        assert!(Trigger::Daily { hour: 23, minute: 60 }.validate().is_err());
        assert!(Trigger::Daily { hour: 23, minute: 59 }.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_cron_field_count() {
        let err = Trigger::Cron {
            expression: "* *".to_string(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, TriggerError::FieldCount(2));

        // The seconds column is added internally; a 6-field expression is
        // user error, not a pass-through.
        assert!(
            Trigger::Cron {
                expression: "0 0 3 * * *".to_string()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_unparseable_cron() {
        let err = Trigger::Cron {
            expression: "a b c d e".to_string(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, TriggerError::InvalidCron(_)));
    }

    #[test]
    fn test_none_is_always_valid_and_never_fires() {
        assert!(Trigger::None.validate().is_ok());
        assert!(Trigger::None.next_fire_at(Utc::now(), None).is_none());
    }

    #[test]
    fn test_interval_next_fire() {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let next = Trigger::Interval { seconds: 90 }
            .next_fire_at(from, None)
            .unwrap();
        assert_eq!(next - from, Duration::seconds(90));
    }

    #[test]
    fn test_daily_next_fire_in_timezone() {
        let tz: Tz = "Asia/Shanghai".parse().unwrap();
        // 2024-01-15 00:00 UTC is 08:00 in Shanghai, past 03:00 already.
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let next = Trigger::Daily { hour: 3, minute: 0 }
            .next_fire_at(from, Some(tz))
            .unwrap();
        let local = next.with_timezone(&tz);
        assert_eq!((local.hour(), local.minute()), (3, 0));
        assert_eq!(
            local.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }

    #[test]
    fn test_cron_fires_daily_at_three_in_configured_zone() {
        let tz: Tz = "Asia/Shanghai".parse().unwrap();
        let trigger = Trigger::Cron {
            expression: "0 3 * * *".to_string(),
        };

        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let first = trigger.next_fire_at(from, Some(tz)).unwrap();
        let local = first.with_timezone(&tz);
        assert_eq!((local.hour(), local.minute()), (3, 0));

        // Advancing the clock to the firing instant lands the next one
        // exactly a day later.
        let second = trigger.next_fire_at(first, Some(tz)).unwrap();
        assert_eq!(second - first, Duration::days(1));
    }

    #[test]
    fn test_daily_from_hhmm() {
        assert_eq!(
            Trigger::daily_from_hhmm("03:30").unwrap(),
            Trigger::Daily { hour: 3, minute: 30 }
        );
        assert_eq!(
            Trigger::daily_from_hhmm("04:00").unwrap(),
            Trigger::Daily { hour: 4, minute: 0 }
        );
        assert!(Trigger::daily_from_hhmm("24:00").is_err());
        assert!(Trigger::daily_from_hhmm("0330").is_err());
        assert!(Trigger::daily_from_hhmm("three:ten").is_err());
    }
}
