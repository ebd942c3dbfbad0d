//! Routes parsed statement rows into the income and expense worksheets.
//!
//! Rows arrive as `[header, data...]`. Each destination gets its own
//! partition (header in front), optionally trimmed against the resume cursor
//! stored at the destination, sorted by date key and inserted one row at a
//! time below the anchor.

use chrono::NaiveDateTime;
use scrooge_core::time::parse_key;
use scrooge_core::{BankKind, ClassificationRule, Destination, Flow, Row, SheetsConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{SheetsBackend, Worksheet};
use crate::client::RetryingTableClient;
use crate::error::SheetsError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Skip rows not newer than the key already stored at each anchor.
    pub resume_mode: bool,
    /// Insert oldest first instead of newest first.
    pub ordered: bool,
}

/// A data row dropped because its date key could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub flow: Flow,
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows prepared for the income worksheet.
    pub income: usize,
    pub expense: usize,
    pub income_inserted: usize,
    pub expense_inserted: usize,
    /// Rows at or before the resume cursor.
    pub skipped: usize,
    pub rejected: Vec<RejectedRow>,
}

impl IngestReport {
    /// `[income, expense]` prepared counts.
    pub fn counts(&self) -> [usize; 2] {
        [self.income, self.expense]
    }

    pub fn inserted(&self) -> usize {
        self.income_inserted + self.expense_inserted
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("split_income_expenses is disabled; ingest needs separate income and expense worksheets")]
    SplitModeRequired,

    #[error(transparent)]
    Sheets(#[from] SheetsError),

    /// Some rows already landed; `report` counts them.
    #[error("ingest interrupted after {} inserted rows: {source}", .report.inserted())]
    Interrupted {
        report: Box<IngestReport>,
        #[source]
        source: SheetsError,
    },
}

#[derive(Debug, Error)]
#[error("insert stopped after {inserted} rows: {source}")]
pub struct InsertInterrupted {
    pub inserted: usize,
    #[source]
    pub source: SheetsError,
}

#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub rows: Vec<Row>,
    /// Raw key and parse error of every dropped row.
    pub rejected: Vec<(String, chrono::ParseError)>,
    /// Rows filtered out by the cursor.
    pub stale: usize,
}

/// Drop the header, drop rows whose key does not parse, keep keys strictly
/// after `cursor`, then sort by key (ascending when `ordered`, else
/// descending). Ties keep their input order.
pub fn filter_and_sort(rows: Vec<Row>, cursor: Option<NaiveDateTime>, ordered: bool) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows.into_iter().skip(1) {
        match parse_key(row.first().map_or("", String::as_str)) {
            Ok(key) if cursor.is_some_and(|c| key <= c) => outcome.stale += 1,
            Ok(key) => keyed.push((key, row)),
            Err(err) => outcome
                .rejected
                .push((row.first().cloned().unwrap_or_default(), err)),
        }
    }
    if ordered {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    } else {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    }
    outcome.rows = keyed.into_iter().map(|(_, row)| row).collect();
    outcome
}

pub struct InsertionEngine<B> {
    client: RetryingTableClient<B>,
    income: Destination,
    expense: Destination,
    split: bool,
    rule: ClassificationRule,
}

impl<B: SheetsBackend> InsertionEngine<B> {
    pub fn new(client: RetryingTableClient<B>, cfg: &SheetsConfig, bank: BankKind) -> Self {
        Self {
            client,
            income: cfg.income_destination(),
            expense: cfg.expense_destination(),
            split: cfg.split_income_expenses,
            rule: ClassificationRule::for_bank(bank),
        }
    }

    pub fn with_rule(mut self, rule: ClassificationRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_destinations(mut self, income: Destination, expense: Destination) -> Self {
        self.income = income;
        self.expense = expense;
        self
    }

    pub fn client(&self) -> &RetryingTableClient<B> {
        &self.client
    }

    pub fn classify(&self, row: &[String]) -> Flow {
        self.rule.classify(row)
    }

    /// Date key stored where the destination's newest batch starts, if any.
    pub async fn read_cursor(
        &self,
        worksheet: &Worksheet,
        destination: &Destination,
    ) -> Result<Option<NaiveDateTime>, SheetsError> {
        let row = destination.first_insert_position();
        let values = self.client.read_range(worksheet, &format!("{row}:{row}")).await?;
        let cursor = values
            .first()
            .and_then(|r| r.first())
            .and_then(|key| parse_key(key).ok());
        debug!(worksheet = %worksheet.title, row, ?cursor, "ingest: resume cursor");
        Ok(cursor)
    }

    /// Insert `rows` in the given order starting at the destination's first
    /// insert position, so they end up contiguous and in that order. With
    /// `include`, rows of the other flow are skipped.
    pub async fn insert_sequential(
        &self,
        destination: &Destination,
        rows: &[Row],
        include: Option<Flow>,
    ) -> Result<usize, InsertInterrupted> {
        let mut inserted = 0;
        let result = match self.client.get_worksheet(&destination.worksheet).await {
            Ok(ws) => self.insert_into(&ws, destination, rows, include, &mut inserted).await,
            Err(err) => Err(err),
        };
        result
            .map(|()| inserted)
            .map_err(|source| InsertInterrupted { inserted, source })
    }

    async fn insert_into(
        &self,
        worksheet: &Worksheet,
        destination: &Destination,
        rows: &[Row],
        include: Option<Flow>,
        inserted: &mut usize,
    ) -> Result<(), SheetsError> {
        let mut position = destination.first_insert_position();
        for row in rows {
            if include.is_some_and(|flow| self.classify(row) != flow) {
                continue;
            }
            self.client.insert_row(worksheet, position, row).await?;
            *inserted += 1;
            position = position.saturating_add(1);
        }
        Ok(())
    }

    /// Split `rows` (`[header, data...]`) by flow and insert each partition
    /// into its worksheet.
    pub async fn ingest(&mut self, rows: &[Row], options: IngestOptions) -> Result<IngestReport, IngestError> {
        if !self.split {
            return Err(IngestError::SplitModeRequired);
        }
        let mut report = IngestReport::default();
        let Some((header, data)) = rows.split_first() else {
            return Ok(report);
        };

        let mut income = vec![header.clone()];
        let mut expense = vec![header.clone()];
        for row in data {
            match self.classify(row) {
                Flow::Income => income.push(row.clone()),
                Flow::Expense => expense.push(row.clone()),
            }
        }

        for (flow, partition) in [(Flow::Income, income), (Flow::Expense, expense)] {
            if partition.len() <= 1 {
                continue;
            }
            if let Err(source) = self.ingest_partition(flow, partition, options, &mut report).await {
                if report.inserted() == 0 {
                    return Err(IngestError::Sheets(source));
                }
                return Err(IngestError::Interrupted {
                    report: Box::new(report),
                    source,
                });
            }
        }
        Ok(report)
    }

    async fn ingest_partition(
        &self,
        flow: Flow,
        partition: Vec<Row>,
        options: IngestOptions,
        report: &mut IngestReport,
    ) -> Result<(), SheetsError> {
        let destination = match flow {
            Flow::Income => &self.income,
            Flow::Expense => &self.expense,
        };
        let ws = self.client.get_worksheet(&destination.worksheet).await?;
        let cursor = if options.resume_mode {
            self.read_cursor(&ws, destination).await?
        } else {
            None
        };

        let outcome = filter_and_sort(partition, cursor, options.ordered);
        for (key, err) in outcome.rejected {
            warn!(worksheet = %ws.title, key = %key, error = %err, "ingest: dropping row with unreadable date");
            report.rejected.push(RejectedRow {
                flow,
                key,
                reason: err.to_string(),
            });
        }
        report.skipped += outcome.stale;

        let prepared = outcome.rows.len();
        let inserted = match flow {
            Flow::Income => {
                report.income = prepared;
                &mut report.income_inserted
            }
            Flow::Expense => {
                report.expense = prepared;
                &mut report.expense_inserted
            }
        };
        self.insert_into(&ws, destination, &outcome.rows, None, inserted).await?;

        info!(
            worksheet = %ws.title,
            prepared,
            stale = outcome.stale,
            anchor = destination.anchor_row,
            "ingest: destination done"
        );
        Ok(())
    }
}
