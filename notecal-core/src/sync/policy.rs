//! What to do when a single record cannot become an event.

use std::sync::Arc;

use crate::error::RecordError;
use crate::record::RawRecord;

/// Decision returned by a [`RecordErrorPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordAction {
    /// Leave the record out and keep going.
    Skip,
    /// Stop the run. Nothing is persisted and no document is produced.
    Abort { reason: String },
}

/// Called once for every record that fails validation or is a duplicate.
pub type RecordErrorPolicy = Arc<dyn Fn(&RecordError, &RawRecord) -> RecordAction + Send + Sync>;

/// Log the error at `warn` and skip the record.
pub fn log_and_skip() -> RecordErrorPolicy {
    Arc::new(|error: &RecordError, record: &RawRecord| {
        tracing::warn!(record_id = %record.id, error = %error, "Skipping record");
        RecordAction::Skip
    })
}

/// Abort on the first bad record.
pub fn abort_on_error() -> RecordErrorPolicy {
    Arc::new(|error: &RecordError, _record: &RawRecord| RecordAction::Abort {
        reason: error.to_string(),
    })
}
