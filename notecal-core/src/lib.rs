//! Convert a paginated database of records into an iCalendar document.
//!
//! A run walks every page of the remote [`remote::RecordSource`], turns each
//! record into an [`event::Event`], and renders the result with an
//! [`ics::CalendarEncoder`]. When a [`state::StateStore`] is configured, later
//! runs only fetch records edited since the previous one and merge them into
//! the stored events.

pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod extract;
pub mod ics;
pub mod record;
pub mod remote;
pub mod state;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use error::{NotecalError, NotecalResult};
pub use sync::{Conversion, ConvertRequest, Converter, SyncReport};
