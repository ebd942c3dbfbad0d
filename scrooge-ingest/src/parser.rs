use std::path::PathBuf;

use scrooge_core::{BankKind, Row};
use tracing::{debug, info};

use crate::error::{ParseError, Result};
use crate::parsers;
use crate::sources::{self, FileFormat};

/// Reads one statement file into serialized canonical rows.
#[derive(Debug, Clone)]
pub struct StatementParser {
    path: PathBuf,
    bank: BankKind,
}

impl StatementParser {
    /// Fails fast on an unknown bank tag.
    pub fn new(path: impl Into<PathBuf>, bank: &str) -> Result<Self> {
        let bank = bank
            .parse::<BankKind>()
            .map_err(|e| ParseError::UnsupportedBankKind(e.0))?;
        Ok(Self::with_bank(path, bank))
    }

    pub fn with_bank(path: impl Into<PathBuf>, bank: BankKind) -> Self {
        Self {
            path: path.into(),
            bank,
        }
    }

    pub fn bank(&self) -> BankKind {
        self.bank
    }

    /// Parse the whole file.
    ///
    /// The result always starts with the header row (re-ordered like the data)
    /// followed by data rows in file order. Rows above the header and blank rows
    /// are skipped. Any row that does not fit the bank's layout fails the parse.
    pub fn parse(self) -> Result<Vec<Row>> {
        let raw = match FileFormat::from_path(&self.path)? {
            FileFormat::Delimited => sources::read_delimited(&self.path)?,
            FileFormat::Workbook => sources::read_workbook(&self.path)?,
        };
        let rows = self.process(raw)?;
        info!(
            path = %self.path.display(),
            bank = %self.bank,
            rows = rows.len().saturating_sub(1),
            "parsed statement"
        );
        Ok(rows)
    }

    fn process(&self, raw: Vec<Vec<String>>) -> Result<Vec<Row>> {
        let mut header_found = false;
        let mut out = Vec::new();

        for (idx, cells) in raw.into_iter().enumerate() {
            let line = idx + 1;
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            if !header_found {
                let first = cells.first().map(|c| c.trim()).unwrap_or_default();
                if parsers::is_header(self.bank, first) {
                    header_found = true;
                    out.push(parsers::to_record(self.bank, cells, line, true)?.into_row());
                } else {
                    debug!(line, "skipping preamble row");
                }
                continue;
            }
            out.push(parsers::to_record(self.bank, cells, line, false)?.into_row());
        }

        if !header_found {
            return Err(ParseError::MissingHeader {
                bank: self.bank,
                path: self.path.clone(),
            });
        }
        Ok(out)
    }
}
