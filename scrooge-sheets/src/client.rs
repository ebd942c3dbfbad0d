//! Quota-aware wrapper over a [`SheetsBackend`].
//!
//! Every remote call runs under the same policy: a rate-limit answer (HTTP
//! 429) is retried after a fixed delay, up to `max_retries` attempts in
//! total; any other failure is returned immediately.

use std::future::Future;
use std::time::Duration;

use scrooge_core::{Row, SheetsConfig};
use tracing::{debug, warn};

use crate::backend::{SheetsBackend, Worksheet};
use crate::error::{BackendError, Result, SheetsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }

    pub fn from_config(cfg: &SheetsConfig) -> Self {
        Self::new(cfg.retry_delay(), cfg.max_retries)
    }

    /// Total attempts per operation. Zero retries still means one try.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

pub struct RetryingTableClient<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: SheetsBackend> RetryingTableClient<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn get_worksheet(&self, name: &str) -> Result<Worksheet> {
        let backend = &self.backend;
        self.with_retry("get_worksheet", move || backend.worksheet(name))
            .await
    }

    /// Insert `values` as a new row at `row_index`, pushing existing rows down.
    ///
    /// The blank-row insertion and the value write are retried independently,
    /// so a rate limit on the write never inserts a second blank row.
    pub async fn insert_row(&self, worksheet: &Worksheet, row_index: u32, values: &[String]) -> Result<()> {
        check_row(row_index)?;
        let backend = &self.backend;
        self.with_retry("insert_row", move || backend.insert_blank_row(worksheet, row_index))
            .await?;
        if values.is_empty() {
            return Ok(());
        }
        let range = format!("A{row_index}");
        let range = range.as_str();
        let rows = [values.to_vec()];
        let rows = rows.as_slice();
        self.with_retry("update_row", move || backend.put_values(worksheet, range, rows))
            .await
    }

    /// Read an A1 range. An empty range yields an empty vector.
    pub async fn read_range(&self, worksheet: &Worksheet, range: &str) -> Result<Vec<Row>> {
        let backend = &self.backend;
        self.with_retry("read_range", move || backend.get_values(worksheet, range))
            .await
    }

    pub async fn delete_row(&self, worksheet: &Worksheet, row_index: u32) -> Result<()> {
        check_row(row_index)?;
        let backend = &self.backend;
        self.with_retry("delete_row", move || backend.delete_row(worksheet, row_index))
            .await
    }

    pub async fn update_range(&self, worksheet: &Worksheet, range: &str, rows: &[Row]) -> Result<()> {
        let backend = &self.backend;
        self.with_retry("update_range", move || backend.put_values(worksheet, range, rows))
            .await
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, BackendError>>,
    {
        let attempts = self.policy.attempts();
        for attempt in 1..=attempts {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "sheets: succeeded after rate limiting");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_rate_limited() => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = attempts,
                        delay_secs = self.policy.delay.as_secs(),
                        "sheets: rate limited"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(SheetsError::QuotaExhausted { operation, attempts })
    }
}

fn check_row(row_index: u32) -> Result<()> {
    if row_index == 0 {
        return Err(SheetsError::InvalidRowIndex(row_index));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, Scripted};

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn client(backend: MemoryBackend, max_retries: u32) -> RetryingTableClient<MemoryBackend> {
        RetryingTableClient::new(backend, RetryPolicy::new(Duration::from_secs(60), max_retries))
    }

    fn sheet() -> MemoryBackend {
        MemoryBackend::new().with_worksheet("Income", vec![row(&["header"])])
    }

    #[test]
    fn test_attempts_floor() {
        assert_eq!(RetryPolicy::new(Duration::ZERO, 0).attempts(), 1);
        assert_eq!(RetryPolicy::new(Duration::ZERO, 3).attempts(), 3);
    }

    #[test]
    fn test_policy_from_config() {
        let cfg = SheetsConfig {
            retry_delay: 5,
            max_retries: 2,
            ..SheetsConfig::default()
        };
        assert_eq!(
            RetryPolicy::from_config(&cfg),
            RetryPolicy::new(Duration::from_secs(5), 2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausts_after_max_retries() {
        let backend = sheet();
        backend.rate_limit_always();
        let c = client(backend, 3);
        let err = c.get_worksheet("Income").await.unwrap_err();
        assert!(matches!(
            err,
            SheetsError::QuotaExhausted {
                operation: "get_worksheet",
                attempts: 3
            }
        ));
        assert_eq!(c.backend().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_between_attempts_only() {
        let backend = sheet();
        backend.push_script([Scripted::RateLimited, Scripted::RateLimited]);
        let c = client(backend, 3);
        let start = tokio::time::Instant::now();
        c.get_worksheet("Income").await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(120) && elapsed < Duration::from_secs(121));
        assert_eq!(c.backend().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_final_attempt() {
        let backend = sheet();
        backend.rate_limit_always();
        let c = client(backend, 2);
        let start = tokio::time::Instant::now();
        assert!(c.get_worksheet("Income").await.is_err());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_is_not_retried() {
        let backend = sheet();
        backend.push_script([Scripted::ServerError(500)]);
        let c = client(backend, 5);
        let err = c.get_worksheet("Income").await.unwrap_err();
        assert!(matches!(
            err,
            SheetsError::Backend(BackendError::Api { status: 500, .. })
        ));
        assert_eq!(c.backend().calls(), 1);
    }

    #[tokio::test]
    async fn test_insert_row_rejects_zero() {
        let c = client(sheet(), 1);
        let ws = c.get_worksheet("Income").await.unwrap();
        let err = c.insert_row(&ws, 0, &row(&["x"])).await.unwrap_err();
        assert!(matches!(err, SheetsError::InvalidRowIndex(0)));
        let err = c.delete_row(&ws, 0).await.unwrap_err();
        assert!(matches!(err, SheetsError::InvalidRowIndex(0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_write_does_not_insert_twice() {
        let c = client(sheet(), 3);
        let ws = c.get_worksheet("Income").await.unwrap();
        // insert ok, write 429, write ok
        c.backend().push_script([Scripted::Pass, Scripted::RateLimited]);
        let before = c.backend().calls();
        c.insert_row(&ws, 2, &row(&["a"])).await.unwrap();
        assert_eq!(c.backend().calls() - before, 3);
        assert_eq!(
            c.backend().rows("Income").unwrap(),
            vec![row(&["header"]), row(&["a"])]
        );
    }

    #[tokio::test]
    async fn test_insert_row_pushes_existing_rows_down() {
        let c = client(sheet(), 1);
        let ws = c.get_worksheet("Income").await.unwrap();
        c.insert_row(&ws, 2, &row(&["a"])).await.unwrap();
        c.insert_row(&ws, 2, &row(&["b"])).await.unwrap();
        assert_eq!(
            c.backend().rows("Income").unwrap(),
            vec![row(&["header"]), row(&["b"]), row(&["a"])]
        );
    }

    #[tokio::test]
    async fn test_read_and_update_range() {
        let c = client(sheet(), 1);
        let ws = c.get_worksheet("Income").await.unwrap();
        c.update_range(&ws, "A2:B3", &[row(&["a", "1"]), row(&["b", "2"])])
            .await
            .unwrap();
        let got = c.read_range(&ws, "2:3").await.unwrap();
        assert_eq!(got, vec![row(&["a", "1"]), row(&["b", "2"])]);
        assert!(c.read_range(&ws, "10:10").await.unwrap().is_empty());
    }
}
