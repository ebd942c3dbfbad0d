//! Settings the ingestion core consumes. Loading and saving them is up to the
//! caller; components receive this struct at construction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::destination::Destination;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// File holding the bearer access token. `SCROOGE_ACCESS_TOKEN` wins when set.
    pub access_token_file: Option<PathBuf>,
    pub worksheet_income_name: String,
    pub worksheet_expenses_name: String,
    /// 1-based anchor rows.
    pub income_start_row: u32,
    pub expenses_start_row: u32,
    pub split_income_expenses: bool,
    /// Seconds to wait after a rate-limit response.
    pub retry_delay: u64,
    pub max_retries: u32,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            access_token_file: None,
            worksheet_income_name: "Income".to_string(),
            worksheet_expenses_name: "Expenses".to_string(),
            income_start_row: 2,
            expenses_start_row: 2,
            split_income_expenses: true,
            // Free-tier Sheets quota is 60 requests/minute.
            retry_delay: 60,
            max_retries: 5,
        }
    }
}

impl SheetsConfig {
    pub fn income_destination(&self) -> Destination {
        Destination::new(&self.worksheet_income_name, self.income_start_row)
    }

    pub fn expense_destination(&self) -> Destination {
        Destination::new(&self.worksheet_expenses_name, self.expenses_start_row)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}
