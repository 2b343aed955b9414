//! Notion database query client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use crate::record::RawRecord;
use crate::remote::{PageQuery, QueryFilter, RecordPage, RecordSource};

const NOTION_API_BASE: &str = "https://api.notion.com/";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Error, Debug)]
pub enum NotionError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Notion API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid query response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    token: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RawRecord>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

impl NotionClient {
    pub fn new(token: &str) -> Result<Self, NotionError> {
        Self::with_base_url(token, NOTION_API_BASE)
    }

    /// Point the client at a different API host (used by tests).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, NotionError> {
        Ok(NotionClient {
            http: Client::new(),
            token: token.to_string(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn query_url(&self, database_id: &str) -> Result<Url, NotionError> {
        Ok(self
            .base_url
            .join(&format!("v1/databases/{}/query", database_id))?)
    }
}

/// Render the filter in the database query dialect.
fn filter_json(filter: &QueryFilter) -> Value {
    let mut conditions = Vec::new();

    if let Some(from) = filter.on_or_after {
        conditions.push(json!({
            "property": filter.date_property,
            "date": { "on_or_after": from.format("%Y-%m-%d").to_string() }
        }));
    }
    if let Some(until) = filter.on_or_before {
        conditions.push(json!({
            "property": filter.date_property,
            "date": { "on_or_before": until.format("%Y-%m-%d").to_string() }
        }));
    }
    if let Some(since) = filter.edited_since {
        conditions.push(json!({
            "timestamp": "last_edited_time",
            "last_edited_time": { "on_or_after": since.to_rfc3339() }
        }));
    }

    json!({ "and": conditions })
}

fn query_body(query: &PageQuery) -> Value {
    let mut body = json!({ "page_size": query.page_size });
    if !query.filter.is_empty() {
        body["filter"] = filter_json(&query.filter);
    }
    if let Some(ref cursor) = query.start_cursor {
        body["start_cursor"] = json!(cursor);
    }
    body
}

#[async_trait]
impl RecordSource for NotionClient {
    type Error = NotionError;

    async fn query(&self, query: &PageQuery) -> Result<RecordPage, NotionError> {
        let response = self
            .http
            .post(self.query_url(&query.database_id)?)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&query_body(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&body)?;

        Ok(RecordPage {
            records: parsed.results,
            next_cursor: if parsed.has_more { parsed.next_cursor } else { None },
        })
    }
}
