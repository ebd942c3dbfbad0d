//! Single-shot remote primitives. No retries happen at this layer.

use std::future::Future;

use scrooge_core::Row;

use crate::error::BackendError;

/// Handle to one worksheet (tab) of the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub id: i64,
    pub title: String,
}

/// A row-oriented spreadsheet store. Row numbers are 1-based; ranges use A1
/// notation relative to the worksheet (`"3:3"`, `"A5"`, `"A2:J9"`).
pub trait SheetsBackend {
    fn worksheet(&self, name: &str) -> impl Future<Output = Result<Worksheet, BackendError>> + Send;

    /// Insert an empty row at `row`, shifting that row and everything below it
    /// down by one.
    fn insert_blank_row(
        &self,
        worksheet: &Worksheet,
        row: u32,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete_row(
        &self,
        worksheet: &Worksheet,
        row: u32,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn get_values(
        &self,
        worksheet: &Worksheet,
        range: &str,
    ) -> impl Future<Output = Result<Vec<Row>, BackendError>> + Send;

    /// Overwrite cells starting at the top-left of `range`.
    fn put_values(
        &self,
        worksheet: &Worksheet,
        range: &str,
        rows: &[Row],
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
