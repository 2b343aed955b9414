//! Calendar serialization.
//!
//! [`build_calendar`] flattens an [`EventMap`] into encoder attributes and
//! hands them to a [`CalendarEncoder`]. [`IcsEncoder`] renders RFC 5545
//! text with the `icalendar` crate.

mod generate;

use chrono::Datelike;

use crate::error::{EncodeError, NotecalResult};
use crate::event::{Event, EventMap, EventSpan};

pub use generate::IcsEncoder;

/// PRODID written into every document.
pub const PRODUCT_ID: &str = "-//notecal//notecal-core//EN";

/// An event time in encoder shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTime {
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    Date { year: i32, month: u32, day: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttributes {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub start: AttributeTime,
    pub end: AttributeTime,
    pub created: i64,
    pub last_modified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarHeader {
    pub name: String,
    pub product_id: String,
}

pub trait CalendarEncoder: Send + Sync {
    fn encode(&self, header: &CalendarHeader, events: &[EventAttributes]) -> Result<String, EncodeError>;
}

impl From<&Event> for EventAttributes {
    fn from(event: &Event) -> Self {
        let (start, end) = match event.span {
            EventSpan::Timed { start, end } => (
                AttributeTime::EpochMillis(start.timestamp_millis()),
                AttributeTime::EpochMillis(end.timestamp_millis()),
            ),
            EventSpan::AllDay { start, end } => (
                AttributeTime::Date {
                    year: start.year(),
                    month: start.month(),
                    day: start.day(),
                },
                AttributeTime::Date {
                    year: end.year(),
                    month: end.month(),
                    day: end.day(),
                },
            ),
        };

        EventAttributes {
            uid: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            start,
            end,
            created: event.created_at.timestamp_millis(),
            last_modified: event.updated_at.timestamp_millis(),
        }
    }
}

/// Render every event in `events` as one calendar document.
///
/// Events are emitted in start order (ties broken by id) so that the same
/// map always produces the same document.
pub fn build_calendar<E: CalendarEncoder + ?Sized>(
    events: &EventMap,
    calendar_name: &str,
    encoder: &E,
) -> NotecalResult<String> {
    let mut ordered: Vec<&Event> = events.values().collect();
    ordered.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)).then_with(|| a.id.cmp(&b.id)));

    let attributes: Vec<EventAttributes> = ordered.into_iter().map(EventAttributes::from).collect();
    let header = CalendarHeader {
        name: calendar_name.to_string(),
        product_id: PRODUCT_ID.to_string(),
    };

    Ok(encoder.encode(&header, &attributes)?)
}

/// All-day events sort as midnight UTC of their start date.
fn sort_key(event: &Event) -> i64 {
    match event.span {
        EventSpan::Timed { start, .. } => start.timestamp_millis(),
        EventSpan::AllDay { start, .. } => start
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp_millis(),
    }
}
