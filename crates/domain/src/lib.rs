mod date;
mod event;
mod sample;
mod shared;

pub use date::{add_months, get_month_length, is_leap_year, CalendarDateProvider, DateProvider};
pub use event::{encode_components, Evaluation, Event, InvalidEventError};
pub use sample::SampleEventGenerator;
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use shared::recurrence::{
    next_due, CalendarUnit, InvalidCalendarUnitError, InvalidRecurrence, Recurrence,
};
