use std::path::PathBuf;

use scrooge_core::BankKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Any of these aborts the whole parse; no partial row set is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported bank kind '{0}' (expected: revolut, unicredit)")]
    UnsupportedBankKind(String),

    #[error("unsupported file format: {} (expected .csv or a spreadsheet workbook)", .0.display())]
    UnsupportedFileFormat(PathBuf),

    #[error("row {line}: {found} cells cannot be mapped to a {bank} transaction ({expected} expected)")]
    UnsupportedTransactionType {
        bank: BankKind,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("no {bank} header row found in {}", .path.display())]
    MissingHeader { bank: BankKind, path: PathBuf },

    #[error("workbook {} has no sheets", .0.display())]
    EmptyWorkbook(PathBuf),

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook: {0}")]
    Workbook(#[from] calamine::Error),
}
