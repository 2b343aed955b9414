//! Fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::record::{PropertyValue, RawRecord};
use crate::remote::{PageQuery, RecordPage, RecordSource};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeSourceError(pub String);

/// Replays scripted pages and remembers every query it received.
#[derive(Debug, Default)]
pub struct FakeSource {
    pages: Mutex<VecDeque<Result<RecordPage, FakeSourceError>>>,
    queries: Mutex<Vec<PageQuery>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_pages(pages: Vec<(Vec<RawRecord>, Option<&str>)>) -> Self {
        let pages = pages
            .into_iter()
            .map(|(records, next)| {
                Ok(RecordPage {
                    records,
                    next_cursor: next.map(String::from),
                })
            })
            .collect();
        FakeSource {
            pages: Mutex::new(pages),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        FakeSource {
            pages: Mutex::new(VecDeque::from([Err(FakeSourceError(message.to_string()))])),
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    type Error = FakeSourceError;

    async fn query(&self, query: &PageQuery) -> Result<RecordPage, FakeSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RecordPage::default()))
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// A record with a `Name` title and a `When` date.
pub fn record(id: &str, title: &str, date: &str) -> RawRecord {
    RawRecord::new(id, at(2025, 1, 1, 0, 0), at(2025, 1, 1, 0, 0))
        .with_property("Name", PropertyValue::title(title))
        .with_property("When", PropertyValue::date(date, None))
}
