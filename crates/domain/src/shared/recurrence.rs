use crate::date::DateProvider;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Calendar component a recurring `Event` advances by
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl CalendarUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl Display for CalendarUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Invalid calendar unit specified: {0}")]
pub struct InvalidCalendarUnitError(String);

impl FromStr for CalendarUnit {
    type Err = InvalidCalendarUnitError;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        match unit.to_lowercase().as_str() {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(InvalidCalendarUnitError(unit.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidRecurrence {
    #[error("Recurrence interval must be positive, got: {0}")]
    NonPositiveInterval(i64),
    #[error("Recurring event is missing its recurrence interval")]
    MissingInterval,
    #[error("Recurring event is missing its recurrence unit")]
    MissingUnit,
    #[error("Next occurrence is outside of the supported date range")]
    OutOfRange,
}

/// A validated recurrence: advance by `interval` x `unit`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recurrence {
    interval: i64,
    unit: CalendarUnit,
}

impl Recurrence {
    pub fn new(interval: i64, unit: CalendarUnit) -> Result<Self, InvalidRecurrence> {
        if interval <= 0 {
            return Err(InvalidRecurrence::NonPositiveInterval(interval));
        }
        Ok(Self { interval, unit })
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn unit(&self) -> CalendarUnit {
        self.unit
    }

    /// The occurrence exactly one period after `due_ts`
    pub fn next_due(&self, provider: &dyn DateProvider, due_ts: i64) -> Result<i64, InvalidRecurrence> {
        next_due(provider, due_ts, self.interval, self.unit)
    }
}

/// Adds `interval` units of `unit` to `current_due_ts` with calendar aware
/// arithmetic supplied by the `DateProvider`.
pub fn next_due(
    provider: &dyn DateProvider,
    current_due_ts: i64,
    interval: i64,
    unit: CalendarUnit,
) -> Result<i64, InvalidRecurrence> {
    if interval <= 0 {
        return Err(InvalidRecurrence::NonPositiveInterval(interval));
    }
    provider
        .add(current_due_ts, unit, interval)
        .ok_or(InvalidRecurrence::OutOfRange)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date::CalendarDateProvider;
    use chrono::prelude::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn parses_valid_units() {
        assert_eq!("day".parse::<CalendarUnit>().unwrap(), CalendarUnit::Day);
        assert_eq!("Month".parse::<CalendarUnit>().unwrap(), CalendarUnit::Month);
        assert_eq!("YEAR".parse::<CalendarUnit>().unwrap(), CalendarUnit::Year);
        assert!("fortnight".parse::<CalendarUnit>().is_err());
        assert!("".parse::<CalendarUnit>().is_err());
    }

    #[test]
    fn unit_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CalendarUnit::Week).unwrap(),
            "\"week\""
        );
        for unit in &[
            CalendarUnit::Second,
            CalendarUnit::Minute,
            CalendarUnit::Hour,
            CalendarUnit::Day,
            CalendarUnit::Week,
            CalendarUnit::Month,
            CalendarUnit::Year,
        ] {
            assert_eq!(unit.to_string().parse::<CalendarUnit>().unwrap(), *unit);
        }
    }

    #[test]
    fn rejects_non_positive_interval() {
        let provider = CalendarDateProvider::utc();
        let due = ts(2022, 6, 27, 12, 0);
        assert_eq!(
            next_due(&provider, due, 0, CalendarUnit::Day),
            Err(InvalidRecurrence::NonPositiveInterval(0))
        );
        assert_eq!(
            next_due(&provider, due, -3, CalendarUnit::Week),
            Err(InvalidRecurrence::NonPositiveInterval(-3))
        );
        assert!(Recurrence::new(0, CalendarUnit::Hour).is_err());
    }

    #[test]
    fn advances_exactly_one_period() {
        let provider = CalendarDateProvider::utc();
        let due = ts(2022, 6, 27, 12, 0);
        let cases = vec![
            (1, CalendarUnit::Second, due + 1000),
            (90, CalendarUnit::Minute, ts(2022, 6, 27, 13, 30)),
            (2, CalendarUnit::Hour, ts(2022, 6, 27, 14, 0)),
            (1, CalendarUnit::Day, ts(2022, 6, 28, 12, 0)),
            (2, CalendarUnit::Week, ts(2022, 7, 11, 12, 0)),
            (1, CalendarUnit::Month, ts(2022, 7, 27, 12, 0)),
            (3, CalendarUnit::Year, ts(2025, 6, 27, 12, 0)),
        ];
        for (interval, unit, expected) in cases {
            assert_eq!(next_due(&provider, due, interval, unit), Ok(expected));
        }
    }

    #[test]
    fn month_end_is_clamped() {
        let provider = CalendarDateProvider::utc();
        let recurrence = Recurrence::new(1, CalendarUnit::Month).unwrap();
        assert_eq!(
            recurrence.next_due(&provider, ts(2023, 1, 31, 9, 0)),
            Ok(ts(2023, 2, 28, 9, 0))
        );
        assert_eq!(
            recurrence.next_due(&provider, ts(2024, 1, 31, 9, 0)),
            Ok(ts(2024, 2, 29, 9, 0))
        );
        // Clamping is not undone by the next step
        assert_eq!(
            recurrence.next_due(&provider, ts(2023, 2, 28, 9, 0)),
            Ok(ts(2023, 3, 28, 9, 0))
        );
    }

    #[test]
    fn leap_day_yearly_recurrence_is_clamped() {
        let provider = CalendarDateProvider::utc();
        assert_eq!(
            next_due(&provider, ts(2024, 2, 29, 0, 0), 1, CalendarUnit::Year),
            Ok(ts(2025, 2, 28, 0, 0))
        );
        assert_eq!(
            next_due(&provider, ts(2024, 2, 29, 0, 0), 4, CalendarUnit::Year),
            Ok(ts(2028, 2, 29, 0, 0))
        );
    }

    #[test]
    fn out_of_range_is_reported() {
        let provider = CalendarDateProvider::utc();
        assert_eq!(
            next_due(&provider, i64::MAX - 10, 1, CalendarUnit::Second),
            Err(InvalidRecurrence::OutOfRange)
        );
        assert_eq!(
            next_due(&provider, ts(2022, 1, 1, 0, 0), i64::MAX, CalendarUnit::Year),
            Err(InvalidRecurrence::OutOfRange)
        );
    }
}
