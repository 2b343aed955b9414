//! In-process state stores.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::state::{IncrementalState, StateStore};

/// Keeps state in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: Mutex<HashMap<String, IncrementalState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, IncrementalState>>, StoreError> {
        self.states
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("state lock poisoned: {e}")))
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &str) -> Result<Option<IncrementalState>, StoreError> {
        let mut states = self.lock()?;
        if states.get(key).is_some_and(|s| !s.is_current_schema()) {
            states.remove(key);
            return Ok(None);
        }
        Ok(states.get(key).cloned())
    }

    async fn save(&self, key: &str, state: &IncrementalState) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), state.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Never remembers anything; every run is a full sync.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStateStore;

#[async_trait]
impl StateStore for NullStateStore {
    async fn load(&self, _key: &str) -> Result<Option<IncrementalState>, StoreError> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _state: &IncrementalState) -> Result<(), StoreError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}
