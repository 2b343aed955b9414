//! Conversion settings.
//!
//! Loaded from a TOML file, then overridden by `NOTECAL_*` environment
//! variables (`NOTECAL_DATABASE_ID`, `NOTECAL_CACHE_DIR`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, TimeDelta};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{NotecalError, NotecalResult};
use crate::extract::FieldNames;
use crate::state::FileStateStore;
use crate::sync::ConvertRequest;

fn default_title_property() -> String {
    "Name".into()
}

fn default_date_property() -> String {
    "Date".into()
}

fn default_calendar_name() -> String {
    "Notion".into()
}

fn default_duration() -> String {
    "1h".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_id: String,

    #[serde(default = "default_title_property")]
    pub title_property: String,

    #[serde(default = "default_date_property")]
    pub date_property: String,

    pub description_property: Option<String>,

    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    /// Humantime span, e.g. "1h" or "45m".
    #[serde(default = "default_duration")]
    pub default_duration: String,

    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,

    /// Defaults to the platform cache directory.
    pub cache_dir: Option<PathBuf>,

    pub cache_max_age: Option<String>,
    pub full_sync_interval: Option<String>,

    #[serde(default)]
    pub strict_storage: bool,
}

impl Settings {
    pub fn load(path: &Path) -> NotecalResult<Self> {
        Self::load_with_env(path, Environment::with_prefix("NOTECAL"))
    }

    fn load_with_env(path: &Path, env: Environment) -> NotecalResult<Self> {
        Config::builder()
            .add_source(File::from(path))
            .add_source(env)
            .build()
            .map_err(|e| NotecalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NotecalError::Config(e.to_string()))
    }

    pub fn fields(&self) -> FieldNames {
        let fields = FieldNames::new(&self.title_property, &self.date_property);
        match &self.description_property {
            Some(description) => fields.with_description(description),
            None => fields,
        }
    }

    pub fn default_duration(&self) -> NotecalResult<Duration> {
        parse_duration("default_duration", &self.default_duration)
    }

    pub fn convert_request(&self) -> NotecalResult<ConvertRequest> {
        let request = ConvertRequest::new(
            &self.database_id,
            self.fields(),
            &self.calendar_name,
            self.default_duration()?,
        );
        Ok(request.with_range(self.from, self.until))
    }

    /// Cache directory with `~` expanded.
    pub fn cache_dir(&self) -> NotecalResult<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(PathBuf::from(
                shellexpand::tilde(&dir.to_string_lossy()).into_owned(),
            )),
            None => Ok(dirs::cache_dir()
                .ok_or_else(|| NotecalError::Config("Could not determine cache directory".into()))?
                .join("notecal")),
        }
    }

    pub fn cache_max_age(&self) -> NotecalResult<Option<TimeDelta>> {
        self.cache_max_age
            .as_deref()
            .map(|value| parse_span("cache_max_age", value))
            .transpose()
    }

    pub fn full_sync_interval(&self) -> NotecalResult<Option<TimeDelta>> {
        self.full_sync_interval
            .as_deref()
            .map(|value| parse_span("full_sync_interval", value))
            .transpose()
    }

    pub fn state_store(&self) -> NotecalResult<FileStateStore> {
        FileStateStore::new(self.cache_dir()?, self.cache_max_age()?)
    }
}

fn parse_duration(key: &str, value: &str) -> NotecalResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| NotecalError::Config(format!("Invalid {key} '{value}': {e}")))
}

fn parse_span(key: &str, value: &str) -> NotecalResult<TimeDelta> {
    let duration = parse_duration(key, value)?;
    TimeDelta::from_std(duration)
        .map_err(|_| NotecalError::Config(format!("Invalid {key} '{value}': out of range")))
}
