use crate::{
    date::DateProvider,
    shared::entity::{Entity, ID},
    shared::recurrence::{CalendarUnit, InvalidRecurrence, Recurrence},
};
use chrono::prelude::*;
use thiserror::Error;

/// A named deadline that is either deleted or rolled forward once it has passed
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: ID,
    pub name: String,
    /// Next (or only) occurrence in millis since the unix epoch
    pub due_ts: i64,
    pub color_hex: String,
    pub is_recurring: bool,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<CalendarUnit>,
    /// Legacy calendar granularity flags. Kept as is and never interpreted.
    pub components: Option<Vec<u8>>,
    /// Bumped by the store on every committed update
    pub version: i64,
    pub created: i64,
    pub updated: i64,
}

impl Entity for Event {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidEventError {
    #[error("Due timestamp: {0} is not a valid instant")]
    InvalidDue(i64),
    #[error(transparent)]
    InvalidRecurrence(#[from] InvalidRecurrence),
}

/// Outcome of checking a single event against the current time
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Not overdue, nothing to do
    Pending,
    /// Overdue one shot event
    Delete,
    /// Overdue recurring event advanced by exactly one period
    RollOver { next_due_ts: i64 },
}

impl Event {
    pub fn new(name: &str, due_ts: i64, color_hex: &str, now: i64) -> Self {
        Self {
            id: Default::default(),
            name: name.into(),
            due_ts,
            color_hex: color_hex.into(),
            is_recurring: false,
            recurrence_interval: None,
            recurrence_unit: None,
            components: None,
            version: 0,
            created: now,
            updated: now,
        }
    }

    pub fn with_recurrence(mut self, interval: i64, unit: CalendarUnit) -> Self {
        self.is_recurring = true;
        self.recurrence_interval = Some(interval);
        self.recurrence_unit = Some(unit);
        self
    }

    /// The recurrence rule of this event, `None` for one shot events
    pub fn recurrence(&self) -> Result<Option<Recurrence>, InvalidRecurrence> {
        if !self.is_recurring {
            return Ok(None);
        }
        let interval = self
            .recurrence_interval
            .ok_or(InvalidRecurrence::MissingInterval)?;
        let unit = self.recurrence_unit.ok_or(InvalidRecurrence::MissingUnit)?;
        Recurrence::new(interval, unit).map(Some)
    }

    pub fn due(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.due_ts).single()
    }

    pub fn validate(&self) -> Result<(), InvalidEventError> {
        if self.due().is_none() {
            return Err(InvalidEventError::InvalidDue(self.due_ts));
        }
        self.recurrence()?;
        Ok(())
    }

    pub fn is_overdue(&self, now: i64) -> bool {
        self.due_ts <= now
    }

    /// Decides what should happen to this event at time `now`.
    /// Recurring events only advance a single period per evaluation,
    /// even when they are overdue by several periods.
    pub fn evaluate(
        &self,
        now: i64,
        provider: &dyn DateProvider,
    ) -> Result<Evaluation, InvalidRecurrence> {
        if !self.is_overdue(now) {
            return Ok(Evaluation::Pending);
        }
        match self.recurrence()? {
            None => Ok(Evaluation::Delete),
            Some(recurrence) => {
                let next_due_ts = recurrence.next_due(provider, self.due_ts)?;
                Ok(Evaluation::RollOver { next_due_ts })
            }
        }
    }
}

/// Encodes calendar units into the legacy `components` blob
pub fn encode_components(units: &[CalendarUnit]) -> Vec<u8> {
    let names = units.iter().map(|u| u.as_str()).collect::<Vec<_>>();
    serde_json::to_vec(&names).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date::CalendarDateProvider;

    const HOUR: i64 = 1000 * 60 * 60;
    const DAY: i64 = HOUR * 24;

    fn now() -> i64 {
        Utc.with_ymd_and_hms(2022, 6, 27, 12, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn one_shot_events_have_no_recurrence() {
        let mut event = Event::new("Dentist", now(), "#ff0000", now());
        // Recurrence fields are ignored when the event is not recurring
        event.recurrence_interval = Some(0);
        assert_eq!(event.recurrence(), Ok(None));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn recurring_event_requires_interval_and_unit() {
        let mut event = Event::new("Gym", now(), "#00ff00", now());
        event.is_recurring = true;
        assert_eq!(event.recurrence(), Err(InvalidRecurrence::MissingInterval));
        event.recurrence_interval = Some(2);
        assert_eq!(event.recurrence(), Err(InvalidRecurrence::MissingUnit));
        event.recurrence_unit = Some(CalendarUnit::Week);
        assert_eq!(
            event.recurrence(),
            Ok(Some(Recurrence::new(2, CalendarUnit::Week).unwrap()))
        );
        event.recurrence_interval = Some(-1);
        assert_eq!(
            event.validate(),
            Err(InvalidEventError::InvalidRecurrence(
                InvalidRecurrence::NonPositiveInterval(-1)
            ))
        );
    }

    #[test]
    fn rejects_unrepresentable_due() {
        let event = Event::new("Far away", i64::MAX, "#000000", now());
        assert_eq!(event.validate(), Err(InvalidEventError::InvalidDue(i64::MAX)));
    }

    #[test]
    fn due_now_counts_as_overdue() {
        let event = Event::new("Now", now(), "#000000", now());
        assert!(event.is_overdue(now()));
        assert!(!event.is_overdue(now() - 1));
    }

    #[test]
    fn pending_events_are_left_alone() {
        let provider = CalendarDateProvider::utc();
        let event = Event::new("Later", now() + HOUR, "#000000", now())
            .with_recurrence(1, CalendarUnit::Day);
        assert_eq!(event.evaluate(now(), &provider), Ok(Evaluation::Pending));
    }

    #[test]
    fn overdue_one_shot_event_is_deleted() {
        let provider = CalendarDateProvider::utc();
        let event = Event::new("Past", now() - HOUR, "#000000", now());
        assert_eq!(event.evaluate(now(), &provider), Ok(Evaluation::Delete));
    }

    #[test]
    fn overdue_recurring_event_rolls_over_a_single_period() {
        let provider = CalendarDateProvider::utc();
        let due = now() - 3 * DAY;
        let event =
            Event::new("Standup", due, "#000000", now()).with_recurrence(1, CalendarUnit::Day);
        // Still overdue afterwards, but only advanced once
        assert_eq!(
            event.evaluate(now(), &provider),
            Ok(Evaluation::RollOver {
                next_due_ts: due + DAY
            })
        );
    }

    #[test]
    fn invalid_recurrence_is_reported_when_overdue() {
        let provider = CalendarDateProvider::utc();
        let mut event = Event::new("Broken", now() - HOUR, "#000000", now())
            .with_recurrence(1, CalendarUnit::Day);
        event.recurrence_interval = Some(0);
        assert_eq!(
            event.evaluate(now(), &provider),
            Err(InvalidRecurrence::NonPositiveInterval(0))
        );
    }

    #[test]
    fn encodes_legacy_components_as_json() {
        let blob = encode_components(&[CalendarUnit::Day, CalendarUnit::Hour]);
        assert_eq!(blob, br#"["day","hour"]"#.to_vec());
    }
}
