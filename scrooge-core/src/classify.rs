//! Income/expense routing rules for serialized rows.
//!
//! Only Revolut rows carry a transaction type, so each bank gets its own
//! explicit rule instead of one hardcoded column.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::BankKind;

/// Which destination a row belongs to in split mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Income,
    Expense,
}

/// Revolut's transaction type for money coming in.
pub const TOPUP: &str = "TOPUP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Income iff the cell at `index` equals `income` exactly.
    Discriminator { index: usize, income: String },
    /// Income iff the amount at `index` is strictly positive.
    AmountSign { index: usize },
}

impl ClassificationRule {
    pub fn for_bank(bank: BankKind) -> Self {
        match bank {
            BankKind::Revolut => ClassificationRule::Discriminator {
                index: 2,
                income: TOPUP.to_string(),
            },
            BankKind::Unicredit => ClassificationRule::AmountSign { index: 2 },
        }
    }

    /// Missing or unreadable cells classify as expense.
    pub fn classify(&self, row: &[String]) -> Flow {
        let income = match self {
            ClassificationRule::Discriminator { index, income } => {
                row.get(*index).is_some_and(|v| v == income)
            }
            ClassificationRule::AmountSign { index } => row
                .get(*index)
                .and_then(|v| parse_amount(v))
                .is_some_and(|a| a > Decimal::ZERO),
        };
        if income { Flow::Income } else { Flow::Expense }
    }
}

/// Parse amounts in either `1,234.56` or `1.234,56` notation, keeping the
/// statement's scale.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if s.is_empty() {
        return None;
    }
    let cleaned = match (s.rfind(','), s.rfind('.')) {
        // 1.234,56
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s,
    };
    Decimal::from_str_exact(cleaned.trim_start_matches('+')).ok()
}
