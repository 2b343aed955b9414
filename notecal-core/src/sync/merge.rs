//! Merge freshly fetched records into the carried-forward event map.

use std::collections::HashSet;

use chrono::TimeDelta;

use crate::error::{NotecalError, NotecalResult, RecordError};
use crate::event::EventMap;
use crate::extract::{FieldNames, extract_event};
use crate::record::RawRecord;
use crate::sync::policy::{RecordAction, RecordErrorPolicy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Apply `records` to `events` in arrival order.
///
/// The first record seen with a given id wins; later ones are reported as
/// [`RecordError::DuplicateEvent`]. A fetched record replaces a carried-forward
/// event with the same id, and a fetched record that fails extraction drops
/// the carried-forward event it used to produce.
pub fn merge_records(
    events: &mut EventMap,
    records: &[RawRecord],
    fields: &FieldNames,
    default_duration: TimeDelta,
    on_error: &RecordErrorPolicy,
) -> NotecalResult<MergeStats> {
    let mut stats = MergeStats::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        let result = if seen.insert(record.id.as_str()) {
            extract_event(record, fields, default_duration)
        } else {
            Err(RecordError::DuplicateEvent {
                record_id: record.id.clone(),
            })
        };

        let error = match result {
            Ok(event) => {
                match events.insert(record.id.clone(), event) {
                    Some(_) => stats.updated += 1,
                    None => stats.inserted += 1,
                }
                continue;
            }
            Err(error) => error,
        };

        if !matches!(error, RecordError::DuplicateEvent { .. })
            && events.remove(&record.id).is_some()
        {
            tracing::debug!(record_id = %record.id, "Dropped cached event for invalid record");
        }
        stats.skipped += 1;

        if let RecordAction::Abort { reason } = on_error(&error, record) {
            return Err(NotecalError::RecordAborted {
                record_id: record.id.clone(),
                reason,
                source: error,
            });
        }
    }

    Ok(stats)
}
