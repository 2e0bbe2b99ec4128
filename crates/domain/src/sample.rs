use crate::{
    date::DateProvider,
    event::{encode_components, Event},
    shared::recurrence::CalendarUnit,
};
use countdown_utils::{create_random_color_hex, create_rng};
use rand::{rngs::StdRng, Rng};

const RECURRENCE_UNITS: [CalendarUnit; 4] = [
    CalendarUnit::Day,
    CalendarUnit::Week,
    CalendarUnit::Month,
    CalendarUnit::Year,
];

const LEGACY_COMPONENTS: [CalendarUnit; 4] = [
    CalendarUnit::Day,
    CalendarUnit::Hour,
    CalendarUnit::Minute,
    CalendarUnit::Second,
];

/// Generates schema valid fixture events for previews and tests.
/// Must never be pointed at a durable store.
pub struct SampleEventGenerator {
    rng: StdRng,
}

impl SampleEventGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: create_rng(seed),
        }
    }

    pub fn generate(&mut self, count: usize, now: i64, provider: &dyn DateProvider) -> Vec<Event> {
        (1..=count)
            .map(|i| self.generate_one(i, now, provider))
            .collect()
    }

    fn generate_one(&mut self, i: usize, now: i64, provider: &dyn DateProvider) -> Event {
        let days_ahead = self.rng.gen_range(10..365);
        let due_ts = provider
            .add(now, CalendarUnit::Day, days_ahead)
            .unwrap_or(now + days_ahead * 1000 * 60 * 60 * 24);
        let color = create_random_color_hex(&mut self.rng);

        let mut event = Event::new(&format!("Event {}", i), due_ts, &color, now);
        event.components = Some(encode_components(&LEGACY_COMPONENTS));
        if self.rng.gen_bool(0.5) {
            let interval = self.rng.gen_range(1..=5);
            let unit = RECURRENCE_UNITS[self.rng.gen_range(0..RECURRENCE_UNITS.len())];
            event = event.with_recurrence(interval, unit);
        }
        event
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date::CalendarDateProvider;

    const DAY: i64 = 1000 * 60 * 60 * 24;

    #[test]
    fn generates_valid_future_events() {
        let provider = CalendarDateProvider::utc();
        let now = 1656331200000;
        let events = SampleEventGenerator::new(Some(42)).generate(50, now, &provider);
        assert_eq!(events.len(), 50);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.name, format!("Event {}", i + 1));
            assert!(event.validate().is_ok());
            assert!(event.due_ts >= now + 10 * DAY);
            assert!(event.due_ts < now + 365 * DAY);
            assert!(!event.is_overdue(now));
            assert_eq!(event.color_hex.len(), 7);
            assert_eq!(
                event.components.as_deref(),
                Some(&br#"["day","hour","minute","second"]"#[..])
            );
            if event.is_recurring {
                let interval = event.recurrence_interval.unwrap();
                assert!((1..=5).contains(&interval));
            }
        }
        assert!(events.iter().any(|e| e.is_recurring));
        assert!(events.iter().any(|e| !e.is_recurring));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let provider = CalendarDateProvider::utc();
        let a = SampleEventGenerator::new(Some(7)).generate(5, 0, &provider);
        let b = SampleEventGenerator::new(Some(7)).generate(5, 0, &provider);
        let strip = |events: Vec<Event>| {
            events
                .into_iter()
                .map(|e| (e.name, e.due_ts, e.color_hex, e.is_recurring, e.recurrence_unit))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(a), strip(b));
    }
}
