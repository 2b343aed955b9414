//! Error types for notecal.

use thiserror::Error;

use crate::record::PropertyKind;

/// Boxed cause reported by a remote record source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a conversion run.
#[derive(Error, Debug)]
pub enum NotecalError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Record '{record_id}' aborted the conversion: {reason}")]
    RecordAborted {
        record_id: String,
        reason: String,
        #[source]
        source: RecordError,
    },

    #[error("Pagination cycle detected: cursor '{cursor}' was returned twice")]
    PaginationCycle { cursor: String },

    #[error("Remote query failed: {0}")]
    RemoteQuery(#[source] SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Calendar build error: {0}")]
    CalendarBuild(#[from] EncodeError),
}

/// Errors produced while turning a single record into an event.
///
/// These never abort a run on their own; they are handed to the record
/// error policy, which decides whether to skip the record or abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Record '{record_id}' is missing property '{property}'")]
    MissingProperty { record_id: String, property: String },

    #[error("Record '{record_id}' property '{property}' is not a {expected} property")]
    InvalidPropertyType {
        record_id: String,
        property: String,
        expected: PropertyKind,
    },

    #[error("Record '{record_id}' has an empty date in property '{property}'")]
    EmptyDate { record_id: String, property: String },

    #[error("Record '{record_id}' has an invalid date in property '{property}': {reason}")]
    DateValue {
        record_id: String,
        property: String,
        reason: String,
    },

    #[error("Record '{record_id}' was returned more than once")]
    DuplicateEvent { record_id: String },
}

impl RecordError {
    pub fn record_id(&self) -> &str {
        match self {
            RecordError::MissingProperty { record_id, .. }
            | RecordError::InvalidPropertyType { record_id, .. }
            | RecordError::EmptyDate { record_id, .. }
            | RecordError::DateValue { record_id, .. }
            | RecordError::DuplicateEvent { record_id } => record_id,
        }
    }
}

/// Errors from an incremental state backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a calendar encoder rejecting its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Event has an empty UID")]
    EmptyUid,

    #[error("Event '{uid}' has an instant outside the representable range: {millis}ms")]
    InstantOutOfRange { uid: String, millis: i64 },

    #[error("Event '{uid}' has an invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate {
        uid: String,
        year: i32,
        month: u32,
        day: u32,
    },

    #[error("Event '{uid}' mixes a date with a timestamp")]
    MixedSpanKinds { uid: String },
}

/// Result type alias for notecal operations.
pub type NotecalResult<T> = Result<T, NotecalError>;
