//! Revolut account statement.
//!
//! Expected columns:
//!   Type,Product,Started Date,Completed Date,Description,Amount,Fee,Currency,State,Balance
//!   TOPUP,Current,2024-03-01 09:15:00,2024-03-01 09:16:00,Top-up by *1234,100.00,0.00,EUR,COMPLETED,250.00

use scrooge_core::time::normalize_key;
use scrooge_core::{CanonicalRecord, RevolutTransaction};

/// The header row starts with a lone `Type` cell.
pub fn is_header(first: &str) -> bool {
    first.eq_ignore_ascii_case("type")
}

/// Map cells in export order. Data rows get their dates normalized; the
/// header row keeps its labels.
pub fn to_record(cells: [String; 10], is_header: bool) -> CanonicalRecord {
    let mut t = RevolutTransaction::from_cells(cells);
    if !is_header {
        t.started_date = normalize_key(&t.started_date);
        t.completed_date = normalize_key(&t.completed_date);
    }
    CanonicalRecord::Revolut(t)
}
