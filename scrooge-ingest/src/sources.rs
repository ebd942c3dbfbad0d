//! Raw cell grids from delimited text and spreadsheet workbooks.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, open_workbook_auto};
use encoding_rs::{UTF_8, WINDOWS_1252};
use scrooge_core::time::{format_key, normalize_key};
use tracing::debug;

use crate::error::{ParseError, Result};

/// Container format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Delimited,
    Workbook,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(FileFormat::Delimited),
            Some("xlsx" | "xlsm" | "xls" | "ods") => Ok(FileFormat::Workbook),
            _ => Err(ParseError::UnsupportedFileFormat(path.to_path_buf())),
        }
    }
}

/// Lines looked at when guessing the delimiter. Exports may open with a few
/// title or account-summary lines that carry no delimiter at all.
const SNIFF_LINES: usize = 20;

/// Pick `;` over `,` when some early line has more of them (Italian exports).
fn sniff_delimiter(text: &str) -> u8 {
    let (mut semis, mut commas) = (0, 0);
    for line in text.lines().filter(|l| !l.trim().is_empty()).take(SNIFF_LINES) {
        semis = semis.max(line.matches(';').count());
        commas = commas.max(line.matches(',').count());
    }
    if semis > commas { b';' } else { b',' }
}

/// UTF-8 (BOM stripped) when valid, otherwise Windows-1252, the encoding of
/// older Italian bank exports.
fn decode(data: &[u8]) -> Cow<'_, str> {
    let data = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);
    match UTF_8.decode_without_bom_handling_and_without_replacement(data) {
        Some(text) => text,
        None => WINDOWS_1252.decode_without_bom_handling(data).0,
    }
}

/// Every record of a CSV file, header included, one `Vec` per line.
///
/// The header is read as an ordinary record so callers see actual rows, never
/// column labels detached from their data.
pub fn read_delimited(path: &Path) -> Result<Vec<Vec<String>>> {
    let data = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(&data);
    let delimiter = sniff_delimiter(&text);
    debug!(path = %path.display(), delimiter = %(delimiter as char), "reading delimited statement");

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Rows of the first sheet, in sheet order.
pub fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>> {
    debug!(path = %path.display(), "reading workbook statement");
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::EmptyWorkbook(PathBuf::from(path)))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::DateTimeIso(s) => normalize_key(s),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(format_key)
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}
