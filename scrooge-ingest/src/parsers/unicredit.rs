//! UniCredit account statement.
//!
//! Expected columns (CSV exports use `;`):
//!   Data;Descrizione;Importo;Valuta
//!   05/02/2024;PAGAMENTO POS COOP;-12,50;EUR

use scrooge_core::time::normalize_key;
use scrooge_core::{CanonicalRecord, UnicreditTransaction};

/// `Data` as a whole word at the start of the first cell (`Data`,
/// `Data Registrazione`).
pub fn is_header(first: &str) -> bool {
    first.get(..4).is_some_and(|w| w.eq_ignore_ascii_case("data"))
        && !first[4..].starts_with(|c: char| c.is_alphanumeric() || c == '_')
}

pub fn to_record(cells: [String; 4], is_header: bool) -> CanonicalRecord {
    let mut t = UnicreditTransaction::from_cells(cells);
    if !is_header {
        t.date = normalize_key(&t.date);
    }
    CanonicalRecord::Unicredit(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_header() {
        assert!(is_header("Data"));
        assert!(is_header("DATA"));
        assert!(is_header("Data Registrazione"));
        assert!(!is_header("Dataset"));
        assert!(!is_header("Dat"));
        assert!(!is_header("05/02/2024"));
    }

    #[test]
    fn test_data_row() {
        let cells = ["05/02/2024", "PAGAMENTO POS COOP", "-12,50", "EUR"].map(str::to_string);
        let row = to_record(cells, false).into_row();
        assert_eq!(row, vec!["2024-02-05T00:00:00", "PAGAMENTO POS COOP", "-12,50", "EUR"]);
    }
}
