//! Cache partition keys.

use sha2::{Digest, Sha256};

use crate::sync::ConvertRequest;

/// Derive the state key for a conversion.
///
/// Every parameter that changes which events a run produces feeds the
/// digest, in a fixed order, each length-prefixed so that adjacent fields
/// cannot run into each other.
pub fn cache_key(request: &ConvertRequest) -> String {
    let mut hasher = Sha256::new();

    let mut field = |value: Option<&str>| match value {
        Some(v) => {
            hasher.update([1u8]);
            hasher.update((v.len() as u64).to_be_bytes());
            hasher.update(v.as_bytes());
        }
        None => hasher.update([0u8]),
    };

    let duration_ms = request.default_duration.as_millis().to_string();
    let from = request.from.map(|d| d.to_string());
    let until = request.until.map(|d| d.to_string());

    field(Some(&request.database_id));
    field(Some(&request.fields.title));
    field(Some(&request.fields.date));
    field(request.fields.description.as_deref());
    field(Some(&request.calendar_name));
    field(Some(&duration_ms));
    field(from.as_deref());
    field(until.as_deref());

    hex::encode(hasher.finalize())
}
