//! Time utilities: the chronological key every serialized row starts with.

use chrono::{NaiveDate, NaiveDateTime};

/// Format of field 0 of every serialized row, e.g. "2024-03-01T09:15:00".
pub const KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw date-time layouts seen in statement exports, tried in order.
const DATETIME_INPUTS: &[&str] = &[
    KEY_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Date-only layouts; these become midnight.
const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Parse a chronological key in the strict `YYYY-MM-DDTHH:MM:SS` form.
pub fn parse_key(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), KEY_FORMAT)
}

pub fn format_key(dt: NaiveDateTime) -> String {
    dt.format(KEY_FORMAT).to_string()
}

/// Parse any of the raw layouts banks export.
pub fn parse_loose(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_INPUTS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Rewrite a raw date cell into key form. Unrecognized input is returned
/// untouched so that the insertion engine can report it.
pub fn normalize_key(raw: &str) -> String {
    match parse_loose(raw) {
        Some(dt) => format_key(dt),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_strict() {
        let dt = parse_key("2024-03-01T09:15:00").unwrap();
        assert_eq!(format_key(dt), "2024-03-01T09:15:00");
        assert!(parse_key("2024-03-01 09:15:00").is_err());
        assert!(parse_key("Started Date").is_err());
    }

    #[test]
    fn test_normalize_revolut_csv_datetime() {
        assert_eq!(normalize_key("2024-03-01 09:15:00"), "2024-03-01T09:15:00");
        assert_eq!(normalize_key(" 2024-03-01T09:15:00 "), "2024-03-01T09:15:00");
    }

    #[test]
    fn test_normalize_italian_dates() {
        assert_eq!(normalize_key("05/02/2024"), "2024-02-05T00:00:00");
        assert_eq!(normalize_key("05.02.2024"), "2024-02-05T00:00:00");
        assert_eq!(normalize_key("05-02-2024"), "2024-02-05T00:00:00");
    }

    #[test]
    fn test_normalize_passes_garbage_through() {
        assert_eq!(normalize_key("Data"), "Data");
        assert_eq!(normalize_key(""), "");
    }
}
