//! JSON-file state store: one document per cache key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{NotecalError, NotecalResult, StoreError};
use crate::state::{IncrementalState, SCHEMA_VERSION, StateStore};

#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
    max_age: Option<TimeDelta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    schema_version: Option<u32>,
}

impl FileStateStore {
    /// Store documents under `dir`. State whose last sync is older than
    /// `max_age` is evicted on load.
    pub fn new(dir: impl AsRef<Path>, max_age: Option<TimeDelta>) -> NotecalResult<Self> {
        if let Some(age) = max_age {
            if age < TimeDelta::zero() {
                return Err(NotecalError::InvalidArgument(format!(
                    "cache max age must not be negative (got {}s)",
                    age.num_seconds()
                )));
            }
        }
        Ok(FileStateStore {
            dir: dir.as_ref().to_path_buf(),
            max_age,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Unavailable(format!("invalid state key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Parse a stored document, or `None` if it is unreadable or from
    /// another schema version.
    fn parse(content: &str) -> Option<IncrementalState> {
        let probe: VersionProbe = serde_json::from_str(content).ok()?;
        if probe.schema_version != Some(SCHEMA_VERSION) {
            return None;
        }
        serde_json::from_str(content).ok()
    }

    fn is_stale(&self, state: &IncrementalState) -> bool {
        self.max_age
            .is_some_and(|max_age| Utc::now() - state.last_synced > max_age)
    }

    async fn discard(path: &Path, reason: &str) -> Result<(), StoreError> {
        tracing::info!(path = %path.display(), reason, "Discarding cached sync state");
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, key: &str) -> Result<Option<IncrementalState>, StoreError> {
        let path = self.path_for(key)?;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(state) = Self::parse(&content) else {
            Self::discard(&path, "unreadable or outdated schema").await?;
            return Ok(None);
        };

        if self.is_stale(&state) {
            Self::discard(&path, "older than max age").await?;
            return Ok(None);
        }

        Ok(Some(state))
    }

    async fn save(&self, key: &str, state: &IncrementalState) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let temp = path.with_extension("json.tmp");
        let content = serde_json::to_string(state)?;

        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventMap, EventSpan};
    use crate::test_support::at;
    use chrono::NaiveDate;

    fn sample_state() -> IncrementalState {
        let mut events = EventMap::new();
        events.insert(
            "timed".into(),
            Event {
                id: "timed".into(),
                title: "Standup".into(),
                description: "Daily".into(),
                span: EventSpan::Timed {
                    start: at(2025, 3, 20, 9, 0),
                    end: at(2025, 3, 20, 9, 15),
                },
                created_at: at(2025, 3, 1, 8, 0),
                updated_at: at(2025, 3, 2, 8, 0),
            },
        );
        events.insert(
            "all-day".into(),
            Event {
                id: "all-day".into(),
                title: "Holiday".into(),
                description: String::new(),
                span: EventSpan::AllDay {
                    start: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                    end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                },
                created_at: at(2024, 1, 1, 0, 0),
                updated_at: at(2024, 1, 1, 0, 0),
            },
        );
        let now = Utc::now();
        IncrementalState::new(now - TimeDelta::days(3), now, events)
    }

    #[tokio::test]
    async fn round_trips_both_event_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), None).unwrap();
        let state = sample_state();

        store.save("abc123", &state).await.unwrap();
        let loaded = store.load("abc123").await.unwrap();

        assert_eq!(loaded, Some(state));
    }

    #[tokio::test]
    async fn document_uses_documented_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), None).unwrap();

        store.save("k", &sample_state()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("k.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(json["events"]["all-day"]["span"]["start"], serde_json::json!([2024, 2, 29]));
        assert_eq!(json["events"]["timed"]["span"]["start"], "2025-03-20T09:00:00Z");
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), None).unwrap();

        assert_eq!(store.load("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn other_schema_version_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), None).unwrap();
        let path = dir.path().join("old.json");
        let mut doc = serde_json::to_value(sample_state()).unwrap();
        doc["schemaVersion"] = serde_json::json!(SCHEMA_VERSION + 1);
        std::fs::write(&path, doc.to_string()).unwrap();

        assert_eq!(store.load("old").await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unparsable_document_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), None).unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(store.load("bad").await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn stale_state_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), Some(TimeDelta::hours(1))).unwrap();
        let mut state = sample_state();
        state.last_synced = Utc::now() - TimeDelta::hours(2);

        store.save("k", &state).await.unwrap();

        assert_eq!(store.load("k").await.unwrap(), None);
        assert!(!dir.path().join("k.json").exists());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path(), None).unwrap();

        store.save("k", &sample_state()).await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();

        assert_eq!(store.load("k").await.unwrap(), None);
    }

    #[test]
    fn negative_max_age_is_rejected() {
        let err = FileStateStore::new("/tmp", Some(TimeDelta::seconds(-1))).unwrap_err();
        assert!(matches!(err, NotecalError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn path_like_keys_are_rejected() {
        let store = FileStateStore::new("/tmp", None).unwrap();
        assert!(store.load("../escape").await.is_err());
    }
}
