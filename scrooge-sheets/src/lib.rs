//! scrooge-sheets: quota-aware spreadsheet access and the insertion engine.
//!
//! Layers, bottom up:
//! - [`SheetsBackend`]: single-shot remote primitives ([`GoogleSheetsBackend`]
//!   over REST, [`MemoryBackend`] in process).
//! - [`RetryingTableClient`]: retries rate-limited calls with a fixed delay.
//! - [`InsertionEngine`]: splits statement rows by flow and inserts them
//!   below each destination's anchor, newest first unless asked otherwise.

pub mod backend;
pub mod client;
pub mod engine;
pub mod error;
pub mod google;
pub mod memory;

pub use backend::{SheetsBackend, Worksheet};
pub use client::{RetryPolicy, RetryingTableClient};
pub use engine::{
    FilterOutcome, IngestError, IngestOptions, IngestReport, InsertInterrupted, InsertionEngine,
    RejectedRow, filter_and_sort,
};
pub use error::{BackendError, SheetsError};
pub use google::{AccessToken, GoogleSheetsBackend};
pub use memory::{MemoryBackend, Scripted};
