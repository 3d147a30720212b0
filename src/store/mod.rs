//! Record Store: saying records persisted in a single SQLite table.
pub mod sayings;

pub use sayings::{ExportPayload, Saying, SayingEntry, SayingStore};
