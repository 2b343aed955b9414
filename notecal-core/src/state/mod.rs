//! Incremental sync state and its persistence.
//!
//! State is stored per cache key (see [`cache_key`]). A snapshot written by a
//! different schema version is treated as absent, never migrated.
//!
//! Nothing here serializes concurrent runs that share a key: the last
//! `save` wins and the other run's merged events are dropped.

pub mod file;
mod key;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::event::EventMap;

pub use file::FileStateStore;
pub use key::cache_key;
pub use memory::{InMemoryStateStore, NullStateStore};

/// Bump when the persisted shape of [`IncrementalState`] changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementalState {
    pub schema_version: u32,
    /// When the current baseline was fetched without a modification filter.
    pub last_full_sync: DateTime<Utc>,
    /// Start of the last run; lower bound for the next run's modification filter.
    pub last_synced: DateTime<Utc>,
    pub events: EventMap,
}

impl IncrementalState {
    pub fn new(last_full_sync: DateTime<Utc>, last_synced: DateTime<Utc>, events: EventMap) -> Self {
        IncrementalState {
            schema_version: SCHEMA_VERSION,
            last_full_sync,
            last_synced,
            events,
        }
    }

    pub fn is_current_schema(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

/// Key-value persistence for [`IncrementalState`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the state for `key`. Missing, stale or incompatible state is `Ok(None)`.
    async fn load(&self, key: &str) -> Result<Option<IncrementalState>, StoreError>;

    async fn save(&self, key: &str, state: &IncrementalState) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
