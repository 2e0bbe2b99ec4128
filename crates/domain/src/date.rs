use crate::shared::recurrence::CalendarUnit;
use chrono::{prelude::*, Days, Duration, LocalResult};
use chrono_tz::Tz;
use std::convert::TryFrom;

/// Calendar aware date arithmetic.
///
/// Implementations decide what "one month" or "one day" means, so the
/// governing calendar and timezone is pluggable instead of hardcoded.
pub trait DateProvider: Send + Sync {
    /// Adds `value` units of `unit` to the millisecond timestamp `ts`.
    /// Returns `None` when the result is not a representable instant.
    fn add(&self, ts: i64, unit: CalendarUnit, value: i64) -> Option<i64>;
}

/// Gregorian calendar evaluated in a given timezone
#[derive(Debug, Clone)]
pub struct CalendarDateProvider {
    timezone: Tz,
}

impl CalendarDateProvider {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn to_local(&self, ts: i64) -> Option<NaiveDateTime> {
        self.timezone
            .timestamp_millis_opt(ts)
            .single()
            .map(|dt| dt.naive_local())
    }

    fn from_local(&self, local: NaiveDateTime) -> Option<i64> {
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.timestamp_millis()),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
            LocalResult::None => {
                // Local time skipped by a DST gap. Interpret it with the offset in
                // effect before the gap which moves it forward by the gap length.
                let before = local.checked_sub_signed(Duration::hours(24))?;
                let offset = self
                    .timezone
                    .offset_from_local_datetime(&before)
                    .earliest()?
                    .fix();
                let utc = local
                    .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
                Some(Utc.from_utc_datetime(&utc).timestamp_millis())
            }
        }
    }

    fn add_local_days(&self, ts: i64, days: i64) -> Option<i64> {
        let local = self.to_local(ts)?;
        let date = if days >= 0 {
            local.date().checked_add_days(Days::new(days.unsigned_abs()))?
        } else {
            local.date().checked_sub_days(Days::new(days.unsigned_abs()))?
        };
        self.from_local(date.and_time(local.time()))
    }

    fn add_local_months(&self, ts: i64, months: i64) -> Option<i64> {
        let local = self.to_local(ts)?;
        let date = add_months(local.date(), months)?;
        self.from_local(date.and_time(local.time()))
    }
}

impl Default for CalendarDateProvider {
    fn default() -> Self {
        Self::utc()
    }
}

impl DateProvider for CalendarDateProvider {
    fn add(&self, ts: i64, unit: CalendarUnit, value: i64) -> Option<i64> {
        match unit {
            CalendarUnit::Second => ts.checked_add(value.checked_mul(1000)?),
            CalendarUnit::Minute => ts.checked_add(value.checked_mul(1000 * 60)?),
            CalendarUnit::Hour => ts.checked_add(value.checked_mul(1000 * 60 * 60)?),
            CalendarUnit::Day => self.add_local_days(ts, value),
            CalendarUnit::Week => self.add_local_days(ts, value.checked_mul(7)?),
            CalendarUnit::Month => self.add_local_months(ts, value),
            CalendarUnit::Year => self.add_local_months(ts, value.checked_mul(12)?),
        }
    }
}

/// Adds calendar months, clamping the day to the length of the target month
pub fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = (i64::from(date.year()) * 12 + i64::from(date.month0())).checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(get_month_length(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 100 != 0 && year % 4 == 0)
}

// month: January -> 1
pub fn get_month_length(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
