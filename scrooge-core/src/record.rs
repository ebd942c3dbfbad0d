//! Canonical transaction records and their serialized row form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One spreadsheet row: plain cell strings in serialized order.
pub type Row = Vec<String>;

/// Source bank of a statement. Each bank maps to one canonical variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankKind {
    Revolut,
    Unicredit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported bank kind '{0}' (expected: revolut, unicredit)")]
pub struct UnknownBankKind(pub String);

impl FromStr for BankKind {
    type Err = UnknownBankKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revolut" => Ok(BankKind::Revolut),
            "unicredit" => Ok(BankKind::Unicredit),
            _ => Err(UnknownBankKind(s.to_string())),
        }
    }
}

impl fmt::Display for BankKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankKind::Revolut => write!(f, "revolut"),
            BankKind::Unicredit => write!(f, "unicredit"),
        }
    }
}

impl BankKind {
    /// Number of cells in a source row (and in the serialized row).
    pub fn field_count(self) -> usize {
        match self {
            BankKind::Revolut => RevolutTransaction::FIELDS,
            BankKind::Unicredit => UnicreditTransaction::FIELDS,
        }
    }
}

/// Revolut export row, in source column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevolutTransaction {
    pub kind: String,
    pub product: String,
    pub started_date: String,
    pub completed_date: String,
    pub description: String,
    pub amount: String,
    pub fee: String,
    pub currency: String,
    pub state: String,
    pub balance: String,
}

impl RevolutTransaction {
    pub const FIELDS: usize = 10;

    /// Build from cells in export order (Type, Product, Started Date, ...).
    pub fn from_cells(cells: [String; 10]) -> Self {
        let [
            kind,
            product,
            started_date,
            completed_date,
            description,
            amount,
            fee,
            currency,
            state,
            balance,
        ] = cells;
        Self {
            kind,
            product,
            started_date,
            completed_date,
            description,
            amount,
            fee,
            currency,
            state,
            balance,
        }
    }
}

/// UniCredit export row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnicreditTransaction {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub currency: String,
}

impl UnicreditTransaction {
    pub const FIELDS: usize = 4;

    pub fn from_cells(cells: [String; 4]) -> Self {
        let [date, description, amount, currency] = cells;
        Self {
            date,
            description,
            amount,
            currency,
        }
    }
}

/// A normalized, bank-agnostic transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanonicalRecord {
    Revolut(RevolutTransaction),
    Unicredit(UnicreditTransaction),
}

impl CanonicalRecord {
    pub fn bank(&self) -> BankKind {
        match self {
            CanonicalRecord::Revolut(_) => BankKind::Revolut,
            CanonicalRecord::Unicredit(_) => BankKind::Unicredit,
        }
    }

    /// Serialized storage order. Field 0 is always the chronological key.
    ///
    /// Revolut: started, completed, type, product, description, amount, fee,
    /// currency, state, balance. UniCredit keeps its source order.
    pub fn into_row(self) -> Row {
        match self {
            CanonicalRecord::Revolut(t) => vec![
                t.started_date,
                t.completed_date,
                t.kind,
                t.product,
                t.description,
                t.amount,
                t.fee,
                t.currency,
                t.state,
                t.balance,
            ],
            CanonicalRecord::Unicredit(t) => vec![t.date, t.description, t.amount, t.currency],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells<const N: usize>(v: [&str; N]) -> [String; N] {
        v.map(str::to_string)
    }

    #[test]
    fn test_bank_kind_parse() {
        assert_eq!("Revolut".parse::<BankKind>().unwrap(), BankKind::Revolut);
        assert_eq!(" unicredit ".parse::<BankKind>().unwrap(), BankKind::Unicredit);
        let err = "n26".parse::<BankKind>().unwrap_err();
        assert_eq!(err, UnknownBankKind("n26".to_string()));
    }

    #[test]
    fn test_revolut_serialized_order() {
        let t = RevolutTransaction::from_cells(cells([
            "TOPUP",
            "Current",
            "2024-03-01T09:15:00",
            "2024-03-01T09:16:00",
            "Top-up by *1234",
            "100.00",
            "0.00",
            "EUR",
            "COMPLETED",
            "250.00",
        ]));
        let row = CanonicalRecord::Revolut(t).into_row();
        assert_eq!(row.len(), BankKind::Revolut.field_count());
        assert_eq!(row[0], "2024-03-01T09:15:00");
        assert_eq!(row[1], "2024-03-01T09:16:00");
        assert_eq!(row[2], "TOPUP");
        assert_eq!(row[9], "250.00");
    }

    #[test]
    fn test_unicredit_serialized_order() {
        let t = UnicreditTransaction::from_cells(cells([
            "2024-02-05T00:00:00",
            "PAGAMENTO POS",
            "-12,50",
            "EUR",
        ]));
        let record = CanonicalRecord::Unicredit(t);
        assert_eq!(record.bank(), BankKind::Unicredit);
        assert_eq!(
            record.into_row(),
            vec!["2024-02-05T00:00:00", "PAGAMENTO POS", "-12,50", "EUR"]
        );
    }

    #[test]
    fn test_bank_kind_serde() {
        let json = serde_json::to_string(&BankKind::Unicredit).unwrap();
        assert_eq!(json, "\"unicredit\"");
    }
}
