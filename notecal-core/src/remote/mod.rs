//! Remote record sources.
//!
//! A [`RecordSource`] answers one paginated query at a time. The
//! [`paginate`] module walks every page of a query; [`notion`] is the HTTP
//! implementation used by the CLI.

pub mod notion;
pub mod paginate;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::record::RawRecord;

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Conjunctive filter applied by the source. Unset bounds are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    /// Name of the date property the bounds apply to.
    pub date_property: String,
    pub on_or_after: Option<NaiveDate>,
    pub on_or_before: Option<NaiveDate>,
    /// Only records modified at or after this instant (incremental runs).
    pub edited_since: Option<DateTime<Utc>>,
}

impl QueryFilter {
    pub fn is_empty(&self) -> bool {
        self.on_or_after.is_none() && self.on_or_before.is_none() && self.edited_since.is_none()
    }
}

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub database_id: String,
    pub page_size: u32,
    pub start_cursor: Option<String>,
    pub filter: QueryFilter,
}

/// One page of results. `next_cursor` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<RawRecord>,
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn query(&self, query: &PageQuery) -> Result<RecordPage, Self::Error>;
}
