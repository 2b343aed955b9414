//! Normalized calendar events.
//!
//! An [`Event`] is what a record becomes once its title, dates and
//! description have been validated. The date shape lives in [`EventSpan`],
//! so an event is either fully timed or fully all-day, never a mix.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Events keyed by the id of the record they came from.
pub type EventMap = HashMap<String, Event>;

/// Placeholder title for records whose title property has no text.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub span: EventSpan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Start and end of an event.
///
/// All-day spans use an exclusive end: a single-day event on March 20th
/// ends on March 21st.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventSpan {
    Timed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    AllDay {
        #[serde(with = "date_triple")]
        start: NaiveDate,
        #[serde(with = "date_triple")]
        end: NaiveDate,
    },
}

impl EventSpan {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventSpan::AllDay { .. })
    }
}

/// Serialize calendar dates as `[year, month, day]`.
mod date_triple {
    use chrono::{Datelike, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeTuple};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&date.year())?;
        tuple.serialize_element(&date.month())?;
        tuple.serialize_element(&date.day())?;
        tuple.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let (year, month, day) = <(i32, u32, u32)>::deserialize(deserializer)?;
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            D::Error::custom(format!("invalid date [{}, {}, {}]", year, month, day))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn all_day_span_serializes_as_triples() {
        let span = EventSpan::AllDay {
            start: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };

        let json = serde_json::to_value(span).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"kind": "allDay", "start": [2024, 2, 29], "end": [2024, 3, 1]})
        );
    }

    #[test]
    fn invalid_triple_is_rejected() {
        let json = r#"{"kind": "allDay", "start": [2023, 2, 29], "end": [2023, 3, 1]}"#;
        assert!(serde_json::from_str::<EventSpan>(json).is_err());
    }

    #[test]
    fn timed_span_uses_iso_strings() {
        let span = EventSpan::Timed {
            start: Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(span).unwrap();

        assert_eq!(json["kind"], "timed");
        assert_eq!(json["start"], "2025-03-20T15:00:00Z");
    }
}
