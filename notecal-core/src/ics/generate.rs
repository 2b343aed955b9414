//! ICS document generation.

use chrono::{DateTime, NaiveDate, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use super::{AttributeTime, CalendarEncoder, CalendarHeader, EventAttributes};
use crate::error::EncodeError;

/// Encoder backed by the `icalendar` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcsEncoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum IcsTime {
    Instant(DateTime<Utc>),
    Date(NaiveDate),
}

impl CalendarEncoder for IcsEncoder {
    fn encode(&self, header: &CalendarHeader, events: &[EventAttributes]) -> Result<String, EncodeError> {
        let mut cal = Calendar::new();
        cal.append_property(Property::new("NAME", &header.name));
        cal.append_property(Property::new("X-WR-CALNAME", &header.name));

        for attrs in events {
            cal.push(build_event(attrs)?);
        }

        let cal = cal.done();
        Ok(finish_ics(&cal.to_string(), &header.product_id))
    }
}

fn build_event(attrs: &EventAttributes) -> Result<icalendar::Event, EncodeError> {
    if attrs.uid.is_empty() {
        return Err(EncodeError::EmptyUid);
    }

    let start = ics_time(&attrs.uid, attrs.start)?;
    let end = ics_time(&attrs.uid, attrs.end)?;
    let same_kind = matches!(
        (start, end),
        (IcsTime::Instant(_), IcsTime::Instant(_)) | (IcsTime::Date(_), IcsTime::Date(_))
    );
    if !same_kind {
        return Err(EncodeError::MixedSpanKinds {
            uid: attrs.uid.clone(),
        });
    }
    // A backwards span is written as zero-length
    let end = end.max(start);

    let created = instant(&attrs.uid, attrs.created)?;
    let last_modified = instant(&attrs.uid, attrs.last_modified)?;

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&attrs.uid);
    ics_event.summary(&attrs.title);

    // DTSTAMP is pinned to the record's last edit so output is reproducible
    ics_event.add_property("DTSTAMP", format_instant(last_modified));
    ics_event.add_property("CREATED", format_instant(created));
    ics_event.add_property("LAST-MODIFIED", format_instant(last_modified));

    add_time_property(&mut ics_event, "DTSTART", start);
    add_time_property(&mut ics_event, "DTEND", end);

    if !attrs.description.is_empty() {
        ics_event.description(&attrs.description);
    }

    Ok(ics_event.done())
}

fn ics_time(uid: &str, time: AttributeTime) -> Result<IcsTime, EncodeError> {
    match time {
        AttributeTime::EpochMillis(millis) => instant(uid, millis).map(IcsTime::Instant),
        AttributeTime::Date { year, month, day } => NaiveDate::from_ymd_opt(year, month, day)
            .map(IcsTime::Date)
            .ok_or_else(|| EncodeError::InvalidDate {
                uid: uid.to_string(),
                year,
                month,
                day,
            }),
    }
}

fn instant(uid: &str, millis: i64) -> Result<DateTime<Utc>, EncodeError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| EncodeError::InstantOutOfRange {
        uid: uid.to_string(),
        millis,
    })
}

fn format_instant(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn add_time_property(ics_event: &mut icalendar::Event, name: &str, time: IcsTime) {
    match time {
        IcsTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        IcsTime::Instant(dt) => {
            ics_event.add_property(name, format_instant(dt));
        }
    }
}

/// Set our PRODID and drop CALSCALE:GREGORIAN (the default).
fn finish_ics(ics: &str, product_id: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(product_id);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
