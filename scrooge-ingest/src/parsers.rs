//! Bank-specific column layouts.

pub mod revolut;
pub mod unicredit;

use scrooge_core::{BankKind, CanonicalRecord};

use crate::error::{ParseError, Result};

/// Whether a row whose first cell is `first` is the bank's header row.
pub fn is_header(bank: BankKind, first: &str) -> bool {
    match bank {
        BankKind::Revolut => revolut::is_header(first),
        BankKind::Unicredit => unicredit::is_header(first),
    }
}

/// Map one raw row onto the bank's canonical variant. `line` is 1-based and
/// only used for error reporting.
pub fn to_record(
    bank: BankKind,
    mut cells: Vec<String>,
    line: usize,
    is_header: bool,
) -> Result<CanonicalRecord> {
    // Workbook ranges are as wide as the widest row; drop the blank tail.
    let expected = bank.field_count();
    while cells.len() > expected && cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }

    let found = cells.len();
    let mismatch = || ParseError::UnsupportedTransactionType {
        bank,
        line,
        expected,
        found,
    };
    match bank {
        BankKind::Revolut => {
            let cells: [String; 10] = cells.try_into().map_err(|_| mismatch())?;
            Ok(revolut::to_record(cells, is_header))
        }
        BankKind::Unicredit => {
            let cells: [String; 4] = cells.try_into().map_err(|_| mismatch())?;
            Ok(unicredit::to_record(cells, is_header))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_trailing_empty_cells_ignored() {
        let rec = to_record(
            BankKind::Unicredit,
            row(&["05/02/2024", "POS", "-1,00", "EUR", "", ""]),
            3,
            false,
        )
        .unwrap();
        assert_eq!(rec.into_row().len(), 4);
    }

    #[test]
    fn test_too_many_cells_rejected() {
        let err = to_record(
            BankKind::Unicredit,
            row(&["05/02/2024", "POS", "-1,00", "EUR", "extra"]),
            7,
            false,
        )
        .unwrap_err();
        match err {
            ParseError::UnsupportedTransactionType {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!((line, expected, found), (7, 4, 5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let err = to_record(BankKind::Revolut, row(&["CARD_PAYMENT", "Current"]), 4, false)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnsupportedTransactionType { found: 2, .. }
        ));
    }

    #[test]
    fn test_pending_revolut_row_with_blank_cells() {
        let rec = to_record(
            BankKind::Revolut,
            row(&[
                "CARD_PAYMENT", "Current", "2024-03-02 18:40:11", "", "Coop", "-23.10", "0.00",
                "EUR", "PENDING", "",
            ]),
            4,
            false,
        )
        .unwrap();
        let r = rec.into_row();
        assert_eq!(r.len(), 10);
        assert_eq!(r[1], "");
        assert_eq!(r[9], "");
    }
}
