//! Walk every page of a remote query.

use std::collections::HashSet;

use crate::error::{NotecalError, NotecalResult};
use crate::record::RawRecord;
use crate::remote::{PAGE_SIZE, PageQuery, QueryFilter, RecordSource};

/// Fetch all records matching `filter`, following cursors until the source
/// reports no next page.
///
/// A cursor that has already been consumed (including the initial "no
/// cursor" request) aborts the walk with [`NotecalError::PaginationCycle`].
pub async fn fetch_all<S: RecordSource + ?Sized>(
    source: &S,
    database_id: &str,
    filter: QueryFilter,
) -> NotecalResult<Vec<RawRecord>> {
    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut records = Vec::new();
    let mut query = PageQuery {
        database_id: database_id.to_string(),
        page_size: PAGE_SIZE,
        start_cursor: None,
        filter,
    };

    loop {
        seen.insert(query.start_cursor.clone());

        let page = source
            .query(&query)
            .await
            .map_err(|e| NotecalError::RemoteQuery(Box::new(e)))?;

        tracing::debug!(
            database_id,
            cursor = ?query.start_cursor,
            count = page.records.len(),
            "Fetched page"
        );
        records.extend(page.records);

        let Some(next) = page.next_cursor else {
            break;
        };
        if seen.contains(&Some(next.clone())) {
            return Err(NotecalError::PaginationCycle { cursor: next });
        }
        query.start_cursor = Some(next);
    }

    Ok(records)
}
