//! In-process spreadsheet backend.
//!
//! Behaves like the remote store for row insertion and range reads, and can
//! be scripted to answer with rate-limit or server errors. Used by `--dry-run`
//! and by the test suites.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use scrooge_core::Row;

use crate::backend::{SheetsBackend, Worksheet};
use crate::error::BackendError;

/// Canned answer for the next backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    /// Let the call through unchanged.
    Pass,
    RateLimited,
    ServerError(u16),
}

#[derive(Debug, Default)]
struct State {
    sheets: Vec<(String, Vec<Row>)>,
    script: VecDeque<Scripted>,
    always_rate_limited: bool,
    inserts_before_failure: Option<usize>,
    calls: usize,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worksheet(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.lock().sheets.push((name.into(), rows));
        self
    }

    /// Current content of a worksheet, or `None` if it does not exist.
    pub fn rows(&self, name: &str) -> Option<Vec<Row>> {
        self.lock()
            .sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| rows.clone())
    }

    /// Answer the next calls, in order, with these outcomes.
    pub fn push_script(&self, outcomes: impl IntoIterator<Item = Scripted>) {
        self.lock().script.extend(outcomes);
    }

    /// Every call from now on is rate limited.
    pub fn rate_limit_always(&self) {
        self.lock().always_rate_limited = true;
    }

    /// Let `n` row insertions succeed, then fail every further one with HTTP 500.
    pub fn fail_inserts_after(&self, n: usize) {
        self.lock().inserts_before_failure = Some(n);
    }

    /// Number of backend calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and apply any scripted failure.
    fn begin(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock();
        state.calls += 1;
        match state.script.pop_front() {
            Some(Scripted::RateLimited) => return Err(BackendError::RateLimited),
            Some(Scripted::ServerError(status)) => {
                return Err(BackendError::Api {
                    status,
                    message: "scripted failure".to_string(),
                });
            }
            Some(Scripted::Pass) | None => {}
        }
        if state.always_rate_limited {
            return Err(BackendError::RateLimited);
        }
        Ok(state)
    }
}

impl State {
    fn sheet_mut(&mut self, ws: &Worksheet) -> Result<&mut Vec<Row>, BackendError> {
        self.sheets
            .iter_mut()
            .find(|(n, _)| *n == ws.title)
            .map(|(_, rows)| rows)
            .ok_or_else(|| BackendError::WorksheetNotFound(ws.title.clone()))
    }
}

/// First and last 1-based rows of an A1 range such as `"3:3"`, `"A5"` or `"A2:J9"`.
pub(crate) fn row_bounds(range: &str) -> Option<(u32, u32)> {
    let row_of = |part: &str| -> Option<u32> {
        let digits: String = part
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    };
    let mut parts = range.splitn(2, ':');
    let start = row_of(parts.next()?)?;
    let end = match parts.next() {
        Some(p) => row_of(p)?,
        None => start,
    };
    (start >= 1 && end >= start).then_some((start, end))
}

fn bad_range(range: &str) -> BackendError {
    BackendError::Api {
        status: 400,
        message: format!("unable to parse range: {range}"),
    }
}

impl SheetsBackend for MemoryBackend {
    async fn worksheet(&self, name: &str) -> Result<Worksheet, BackendError> {
        let state = self.begin()?;
        state
            .sheets
            .iter()
            .position(|(n, _)| n == name)
            .map(|idx| Worksheet {
                id: idx as i64,
                title: name.to_string(),
            })
            .ok_or_else(|| BackendError::WorksheetNotFound(name.to_string()))
    }

    async fn insert_blank_row(&self, worksheet: &Worksheet, row: u32) -> Result<(), BackendError> {
        let mut state = self.begin()?;
        if let Some(left) = state.inserts_before_failure.as_mut() {
            if *left == 0 {
                return Err(BackendError::Api {
                    status: 500,
                    message: "internal error".to_string(),
                });
            }
            *left -= 1;
        }
        let rows = state.sheet_mut(worksheet)?;
        let idx = (row.max(1) - 1) as usize;
        if rows.len() < idx {
            rows.resize(idx, Row::new());
        }
        rows.insert(idx, Row::new());
        Ok(())
    }

    async fn delete_row(&self, worksheet: &Worksheet, row: u32) -> Result<(), BackendError> {
        let mut state = self.begin()?;
        let rows = state.sheet_mut(worksheet)?;
        let idx = (row.max(1) - 1) as usize;
        if idx < rows.len() {
            rows.remove(idx);
        }
        Ok(())
    }

    async fn get_values(&self, worksheet: &Worksheet, range: &str) -> Result<Vec<Row>, BackendError> {
        let mut state = self.begin()?;
        let (start, end) = row_bounds(range).ok_or_else(|| bad_range(range))?;
        let rows = state.sheet_mut(worksheet)?;
        let from = (start - 1) as usize;
        let to = (end as usize).min(rows.len());
        let mut out: Vec<Row> = rows.get(from..to).map(<[Row]>::to_vec).unwrap_or_default();
        // The API omits trailing empty rows.
        while out.last().is_some_and(|r| r.iter().all(String::is_empty)) {
            out.pop();
        }
        Ok(out)
    }

    async fn put_values(&self, worksheet: &Worksheet, range: &str, values: &[Row]) -> Result<(), BackendError> {
        let mut state = self.begin()?;
        let (start, _) = row_bounds(range).ok_or_else(|| bad_range(range))?;
        let rows = state.sheet_mut(worksheet)?;
        for (offset, value) in values.iter().enumerate() {
            let idx = (start - 1) as usize + offset;
            if rows.len() <= idx {
                rows.resize(idx + 1, Row::new());
            }
            rows[idx] = value.clone();
        }
        Ok(())
    }
}
