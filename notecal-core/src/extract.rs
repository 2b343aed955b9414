//! Record validation and event extraction.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::date::{self, DateContext};
use crate::error::RecordError;
use crate::event::{Event, UNTITLED};
use crate::record::{PropertyKind, PropertyValue, RawRecord, RichText};

/// Names of the properties that hold an event's title, dates and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldNames {
    pub fn new(title: &str, date: &str) -> Self {
        FieldNames {
            title: title.to_string(),
            date: date.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Turn one record into an event.
///
/// Checks run in a fixed order (title, date, description, date values) and
/// the first failure is returned.
pub fn extract_event(
    record: &RawRecord,
    fields: &FieldNames,
    default_duration: TimeDelta,
) -> Result<Event, RecordError> {
    let title_runs = match require(record, &fields.title)? {
        PropertyValue::Title { title } => title,
        _ => return Err(wrong_kind(record, &fields.title, PropertyKind::Title)),
    };

    let date_value = match require(record, &fields.date)? {
        PropertyValue::Date { date } => date.as_ref(),
        _ => return Err(wrong_kind(record, &fields.date, PropertyKind::Date)),
    };
    let date_value = date_value
        .filter(|d| !d.start.is_empty())
        .ok_or_else(|| RecordError::EmptyDate {
            record_id: record.id.clone(),
            property: fields.date.clone(),
        })?;

    let description_runs = match fields.description.as_deref() {
        Some(name) => match require(record, name)? {
            PropertyValue::RichText { rich_text } => Some(rich_text),
            _ => return Err(wrong_kind(record, name, PropertyKind::RichText)),
        },
        None => None,
    };

    let span = date::normalize(
        &date_value.start,
        date_value.end.as_deref().filter(|end| !end.is_empty()),
        default_duration,
        DateContext {
            record_id: &record.id,
            property: &fields.date,
        },
    )?;

    let title = RichText::join(title_runs).unwrap_or_else(|| UNTITLED.to_string());
    let description = description_runs
        .and_then(|runs| RichText::join(runs))
        .unwrap_or_default();

    Ok(Event {
        id: record.id.clone(),
        title,
        description,
        span,
        created_at: record.created_time,
        updated_at: record.last_edited_time,
    })
}

fn require<'r>(record: &'r RawRecord, name: &str) -> Result<&'r PropertyValue, RecordError> {
    record
        .property(name)
        .ok_or_else(|| RecordError::MissingProperty {
            record_id: record.id.clone(),
            property: name.to_string(),
        })
}

fn wrong_kind(record: &RawRecord, name: &str, expected: PropertyKind) -> RecordError {
    RecordError::InvalidPropertyType {
        record_id: record.id.clone(),
        property: name.to_string(),
        expected,
    }
}
