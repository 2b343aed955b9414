//! Raw records as returned by a remote database query.
//!
//! The shape follows the database page JSON: every record has an id,
//! creation and last-edit timestamps, and a map of named, typed properties.
//! Only the property kinds the extractor cares about are modelled; anything
//! else deserializes to [`PropertyValue::Other`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One record from the remote source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl RawRecord {
    pub fn new(id: &str, created_time: DateTime<Utc>, last_edited_time: DateTime<Utc>) -> Self {
        RawRecord {
            id: id.to_string(),
            created_time,
            last_edited_time,
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    #[serde(other)]
    Other,
}

impl PropertyValue {
    pub fn title(text: &str) -> Self {
        PropertyValue::Title {
            title: RichText::runs(text),
        }
    }

    pub fn rich_text(text: &str) -> Self {
        PropertyValue::RichText {
            rich_text: RichText::runs(text),
        }
    }

    pub fn date(start: &str, end: Option<&str>) -> Self {
        PropertyValue::Date {
            date: Some(DateValue {
                start: start.to_string(),
                end: end.map(String::from),
            }),
        }
    }

    pub fn kind(&self) -> Option<PropertyKind> {
        match self {
            PropertyValue::Title { .. } => Some(PropertyKind::Title),
            PropertyValue::RichText { .. } => Some(PropertyKind::RichText),
            PropertyValue::Date { .. } => Some(PropertyKind::Date),
            PropertyValue::Other => None,
        }
    }
}

/// One run of formatted text; only the plain text is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

impl RichText {
    fn runs(text: &str) -> Vec<RichText> {
        if text.is_empty() {
            return vec![];
        }
        vec![RichText {
            plain_text: text.to_string(),
        }]
    }

    /// Concatenate runs, or `None` when there are no runs at all.
    pub fn join(runs: &[RichText]) -> Option<String> {
        if runs.is_empty() {
            return None;
        }
        Some(runs.iter().map(|r| r.plain_text.as_str()).collect())
    }
}

/// A date property value. `end` is inclusive for date-only values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

/// The property kinds the extractor validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Date,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PropertyKind::Title => "title",
            PropertyKind::RichText => "rich_text",
            PropertyKind::Date => "date",
        };
        write!(f, "{}", name)
    }
}
