//! Conversion runs: fetch, merge, persist, render.

mod merge;
pub mod policy;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::{NotecalError, NotecalResult};
use crate::event::EventMap;
use crate::extract::FieldNames;
use crate::ics::{self, CalendarEncoder, IcsEncoder};
use crate::remote::{QueryFilter, RecordSource, paginate};
use crate::state::{IncrementalState, NullStateStore, StateStore, cache_key};

pub use merge::MergeStats;
pub use policy::{RecordAction, RecordErrorPolicy};

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Parameters of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub database_id: String,
    pub fields: FieldNames,
    pub calendar_name: String,
    /// Length of timed events that have no end.
    pub default_duration: Duration,
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl ConvertRequest {
    pub fn new(
        database_id: &str,
        fields: FieldNames,
        calendar_name: &str,
        default_duration: Duration,
    ) -> Self {
        ConvertRequest {
            database_id: database_id.to_string(),
            fields,
            calendar_name: calendar_name.to_string(),
            default_duration,
            from: None,
            until: None,
        }
    }

    pub fn with_range(mut self, from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.from = from;
        self.until = until;
        self
    }

    /// Reject parameters that can never produce a valid run.
    fn validate(&self) -> NotecalResult<TimeDelta> {
        if let (Some(from), Some(until)) = (self.from, self.until) {
            if from > until {
                return Err(NotecalError::InvalidArgument(format!(
                    "from date {} is after until date {}",
                    from, until
                )));
            }
        }
        TimeDelta::from_std(self.default_duration).map_err(|_| {
            NotecalError::InvalidArgument(format!(
                "default duration {:?} is too large",
                self.default_duration
            ))
        })
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// True when prior state was reused and only modified records were fetched.
    pub incremental: bool,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Events in the final document.
    pub total: usize,
    /// Set when the state could not be saved and the run carried on anyway.
    pub storage_error: Option<String>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: String,
    pub events: EventMap,
    pub report: SyncReport,
}

/// Converts a database into a calendar document, reusing state from
/// earlier runs when a store is configured.
pub struct Converter<S: RecordSource> {
    source: Arc<S>,
    store: Arc<dyn StateStore>,
    encoder: Arc<dyn CalendarEncoder>,
    on_record_error: RecordErrorPolicy,
    now_provider: NowProvider,
    full_sync_interval: Option<TimeDelta>,
    strict_storage: bool,
}

impl<S: RecordSource> Converter<S> {
    pub fn new(source: Arc<S>) -> Self {
        Converter {
            source,
            store: Arc::new(NullStateStore),
            encoder: Arc::new(IcsEncoder),
            on_record_error: policy::log_and_skip(),
            now_provider: Arc::new(Utc::now),
            full_sync_interval: None,
            strict_storage: false,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn CalendarEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_record_error_policy(mut self, policy: RecordErrorPolicy) -> Self {
        self.on_record_error = policy;
        self
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    /// Ignore prior state once its baseline is older than `interval`.
    pub fn with_full_sync_interval(mut self, interval: Option<TimeDelta>) -> Self {
        self.full_sync_interval = interval;
        self
    }

    /// Fail the run when state cannot be saved instead of returning the
    /// document without it.
    pub fn with_strict_storage(mut self, strict: bool) -> Self {
        self.strict_storage = strict;
        self
    }

    pub async fn convert(&self, request: &ConvertRequest) -> NotecalResult<Conversion> {
        let default_duration = request.validate()?;
        let key = cache_key(request);
        let now = (self.now_provider)();

        tracing::info!(database_id = %request.database_id, key = %key, "Starting conversion");

        let prior = self.load_prior(&key, now).await;
        let incremental = prior.is_some();
        let (last_full_sync, edited_since, mut events) = match prior {
            Some(state) => (state.last_full_sync, Some(state.last_synced), state.events),
            None => (now, None, EventMap::new()),
        };

        let filter = QueryFilter {
            date_property: request.fields.date.clone(),
            on_or_after: request.from,
            on_or_before: request.until,
            edited_since,
        };
        let records =
            paginate::fetch_all(self.source.as_ref(), &request.database_id, filter).await?;

        let stats = merge::merge_records(
            &mut events,
            &records,
            &request.fields,
            default_duration,
            &self.on_record_error,
        )?;

        let state = IncrementalState::new(last_full_sync, now, events);
        let storage_error = match self.store.save(&key, &state).await {
            Ok(()) => None,
            Err(e) if self.strict_storage => return Err(e.into()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Could not save sync state; next run will be a full sync");
                Some(e.to_string())
            }
        };

        let document =
            ics::build_calendar(&state.events, &request.calendar_name, self.encoder.as_ref())?;

        let report = SyncReport {
            incremental,
            fetched: records.len(),
            inserted: stats.inserted,
            updated: stats.updated,
            skipped: stats.skipped,
            total: state.events.len(),
            storage_error,
        };
        tracing::info!(
            incremental,
            fetched = report.fetched,
            skipped = report.skipped,
            total = report.total,
            "Conversion finished"
        );

        Ok(Conversion {
            document,
            events: state.events,
            report,
        })
    }

    /// Forget the stored state for `request`; the next run is a full sync.
    pub async fn clear_cache(&self, request: &ConvertRequest) -> NotecalResult<()> {
        self.store.remove(&cache_key(request)).await?;
        Ok(())
    }

    async fn load_prior(&self, key: &str, now: DateTime<Utc>) -> Option<IncrementalState> {
        let state = match self.store.load(key).await {
            Ok(state) => state?,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not load sync state; running a full sync");
                return None;
            }
        };

        if !state.is_current_schema() {
            tracing::info!(key, version = state.schema_version, "Ignoring state from another schema version");
            return None;
        }

        if let Some(interval) = self.full_sync_interval {
            if now - state.last_full_sync > interval {
                tracing::info!(key, last_full_sync = %state.last_full_sync, "Full sync interval elapsed");
                return None;
            }
        }

        Some(state)
    }
}
