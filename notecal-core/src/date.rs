//! Date normalization.
//!
//! Turns the raw start/end strings of a date property into an [`EventSpan`].
//! Date-only values become all-day spans with an exclusive end; anything with
//! a time component becomes a timed span.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::error::RecordError;
use crate::event::EventSpan;

/// Where a date value came from, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct DateContext<'a> {
    pub record_id: &'a str,
    pub property: &'a str,
}

impl DateContext<'_> {
    fn error(&self, reason: String) -> RecordError {
        RecordError::DateValue {
            record_id: self.record_id.to_string(),
            property: self.property.to_string(),
            reason,
        }
    }
}

/// Normalize a start value and optional end value into a span.
///
/// For all-day values `end` is inclusive; the returned span's end is the day
/// after it. For timed values a missing end is `start + default_duration`.
pub fn normalize(
    start: &str,
    end: Option<&str>,
    default_duration: TimeDelta,
    ctx: DateContext<'_>,
) -> Result<EventSpan, RecordError> {
    let all_day = !has_time(start) && !end.is_some_and(has_time);

    if all_day {
        normalize_all_day(start, end, ctx)
    } else {
        normalize_timed(start, end, default_duration, ctx)
    }
}

fn normalize_all_day(
    start: &str,
    end: Option<&str>,
    ctx: DateContext<'_>,
) -> Result<EventSpan, RecordError> {
    let start_date = parse_calendar_date(start, ctx)?;

    let last_day = match end {
        Some(end) => {
            let end_date = parse_calendar_date(end, ctx)?;
            if end_date < start_date {
                return Err(ctx.error(format!(
                    "end date {} is before start date {}",
                    end_date, start_date
                )));
            }
            end_date
        }
        None => start_date,
    };

    let exclusive_end = next_day(last_day, ctx)?;

    Ok(EventSpan::AllDay {
        start: start_date,
        end: exclusive_end,
    })
}

fn normalize_timed(
    start: &str,
    end: Option<&str>,
    default_duration: TimeDelta,
    ctx: DateContext<'_>,
) -> Result<EventSpan, RecordError> {
    let start_instant = parse_instant(start, ctx)?;

    let end_instant = match end {
        Some(end) => parse_instant(end, ctx)?,
        None => start_instant
            .checked_add_signed(default_duration)
            .ok_or_else(|| ctx.error(format!("default duration overflows start {}", start)))?,
    };

    Ok(EventSpan::Timed {
        start: start_instant,
        end: end_instant,
    })
}

fn has_time(value: &str) -> bool {
    value.contains(['T', 't'])
}

/// Parse a strict `YYYY-MM-DD` date.
fn parse_calendar_date(value: &str, ctx: DateContext<'_>) -> Result<NaiveDate, RecordError> {
    if !is_calendar_date_shape(value) {
        return Err(ctx.error(format!("'{}' is not a YYYY-MM-DD date", value)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ctx.error(format!("'{}' is not a valid date: {}", value, e)))
}

fn is_calendar_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse an absolute instant.
///
/// Accepts RFC 3339 timestamps, offset-less timestamps (read as UTC) and
/// bare dates (midnight UTC). The `T` and `Z` designators may be lowercase.
fn parse_instant(value: &str, ctx: DateContext<'_>) -> Result<DateTime<Utc>, RecordError> {
    let upper = value.to_ascii_uppercase();
    if let Ok(dt) = DateTime::parse_from_rfc3339(&upper) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&upper, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&upper, "%Y-%m-%dT%H:%M") {
        return Ok(dt.and_utc());
    }
    if is_calendar_date_shape(value) {
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
    }
    Err(ctx.error(format!("'{}' is not a valid timestamp", value)))
}

fn next_day(date: NaiveDate, ctx: DateContext<'_>) -> Result<NaiveDate, RecordError> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| ctx.error(format!("no day follows {}", date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CTX: DateContext<'static> = DateContext {
        record_id: "rec-1",
        property: "When",
    };

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hour() -> TimeDelta {
        TimeDelta::hours(1)
    }

    #[test]
    fn single_day_ends_next_day() {
        let span = normalize("2025-03-20", None, hour(), CTX).unwrap();
        assert_eq!(
            span,
            EventSpan::AllDay {
                start: ymd(2025, 3, 20),
                end: ymd(2025, 3, 21)
            }
        );
    }

    #[test]
    fn single_day_crosses_leap_day_and_year_end() {
        let leap = normalize("2024-02-28", None, hour(), CTX).unwrap();
        assert_eq!(
            leap,
            EventSpan::AllDay {
                start: ymd(2024, 2, 28),
                end: ymd(2024, 2, 29)
            }
        );

        let new_year = normalize("2024-12-31", None, hour(), CTX).unwrap();
        assert_eq!(
            new_year,
            EventSpan::AllDay {
                start: ymd(2024, 12, 31),
                end: ymd(2025, 1, 1)
            }
        );
    }

    #[test]
    fn inclusive_end_becomes_exclusive() {
        let span = normalize("2025-02-27", Some("2025-02-28"), hour(), CTX).unwrap();
        assert_eq!(
            span,
            EventSpan::AllDay {
                start: ymd(2025, 2, 27),
                end: ymd(2025, 3, 1)
            }
        );
    }

    #[test]
    fn same_day_end_is_one_day_long() {
        let span = normalize("2025-05-01", Some("2025-05-01"), hour(), CTX).unwrap();
        assert_eq!(
            span,
            EventSpan::AllDay {
                start: ymd(2025, 5, 1),
                end: ymd(2025, 5, 2)
            }
        );
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = normalize("2025-05-02", Some("2025-05-01"), hour(), CTX).unwrap_err();
        assert!(matches!(err, RecordError::DateValue { ref record_id, .. } if record_id == "rec-1"));
    }

    #[test]
    fn loose_date_shapes_are_rejected() {
        for value in ["2025-5-1", "20250501", "2025/05/01", "2025-02-30"] {
            let err = normalize(value, None, hour(), CTX).unwrap_err();
            assert!(
                matches!(err, RecordError::DateValue { .. }),
                "{} should fail, got {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn timed_without_end_uses_default_duration() {
        let span = normalize("2025-03-20T15:00:00.000+00:00", None, hour(), CTX).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        assert_eq!(
            span,
            EventSpan::Timed {
                start,
                end: start + hour()
            }
        );
    }

    #[test]
    fn timed_offsets_are_converted_to_utc() {
        let span = normalize(
            "2025-03-20T09:00:00-05:00",
            Some("2025-03-20T10:30:00-05:00"),
            hour(),
            CTX,
        )
        .unwrap();
        assert_eq!(
            span,
            EventSpan::Timed {
                start: Utc.with_ymd_and_hms(2025, 3, 20, 14, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2025, 3, 20, 15, 30, 0).unwrap(),
            }
        );
    }

    #[test]
    fn date_start_with_timed_end_is_timed() {
        let span = normalize("2025-03-20", Some("2025-03-20T12:00:00Z"), hour(), CTX).unwrap();
        assert_eq!(
            span,
            EventSpan::Timed {
                start: Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn lowercase_designators_are_timed() {
        let span = normalize("2025-03-20t15:00:00z", None, hour(), CTX).unwrap();
        assert_eq!(
            span,
            EventSpan::Timed {
                start: Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap(),
            }
        );

        let naive = normalize("2025-03-20t08:30", None, hour(), CTX).unwrap();
        assert!(!naive.is_all_day());
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let err = normalize("2025-03-20Tnoon", None, hour(), CTX).unwrap_err();
        assert!(matches!(err, RecordError::DateValue { .. }));
    }
}
