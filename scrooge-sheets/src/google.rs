//! Google Sheets REST v4 backend.

use std::fmt;

use reqwest::{StatusCode, Url};
use scrooge_core::Row;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::backend::{SheetsBackend, Worksheet};
use crate::error::BackendError;

pub const SHEETS_API: &str = "https://sheets.googleapis.com/";

/// Opaque bearer credential. Obtaining and refreshing it is the caller's job.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

pub struct GoogleSheetsBackend {
    http: reqwest::Client,
    base: Url,
    spreadsheet_id: String,
    token: AccessToken,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheetsBackend {
    pub fn new(spreadsheet_id: impl Into<String>, token: AccessToken) -> Result<Self, BackendError> {
        Self::with_base_url(SHEETS_API, spreadsheet_id, token)
    }

    /// Point at another host (proxies, local emulators).
    pub fn with_base_url(
        base: &str,
        spreadsheet_id: impl Into<String>,
        token: AccessToken,
    ) -> Result<Self, BackendError> {
        let base = Url::parse(base).map_err(|e| BackendError::InvalidEndpoint(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidEndpoint(base.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            spreadsheet_id: spreadsheet_id.into(),
            token,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn values_url(&self, worksheet: &Worksheet, range: &str) -> Result<Url, BackendError> {
        let a1 = a1_range(&worksheet.title, range);
        self.url(&["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", a1.as_str()])
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn batch_update(&self, request: Value) -> Result<(), BackendError> {
        let endpoint = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.url(&["v4", "spreadsheets", endpoint.as_str()])?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token.0)
            .json(&json!({ "requests": [request] }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

/// `'My Sheet'!A1:B2`. Titles are always quoted; embedded quotes are doubled.
pub fn a1_range(title: &str, range: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), range)
}

/// Zero-based, end-exclusive span covering the single 1-based `row`.
fn row_span(worksheet: &Worksheet, row: u32) -> Value {
    json!({
        "sheetId": worksheet.id,
        "dimension": "ROWS",
        "startIndex": row.saturating_sub(1),
        "endIndex": row,
    })
}

fn cell_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetsBackend for GoogleSheetsBackend {
    async fn worksheet(&self, name: &str) -> Result<Worksheet, BackendError> {
        debug!(worksheet = name, "sheets: lookup worksheet");
        let url = self.url(&["v4", "spreadsheets", self.spreadsheet_id.as_str()])?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token.0)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = Self::check(resp).await?.json().await?;
        meta.sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == name)
            .map(|p| Worksheet {
                id: p.sheet_id,
                title: p.title,
            })
            .ok_or_else(|| BackendError::WorksheetNotFound(name.to_string()))
    }

    async fn insert_blank_row(&self, worksheet: &Worksheet, row: u32) -> Result<(), BackendError> {
        debug!(worksheet = %worksheet.title, row, "sheets: insert row");
        self.batch_update(json!({
            "insertDimension": {
                "range": row_span(worksheet, row),
                "inheritFromBefore": row > 1,
            }
        }))
        .await
    }

    async fn delete_row(&self, worksheet: &Worksheet, row: u32) -> Result<(), BackendError> {
        debug!(worksheet = %worksheet.title, row, "sheets: delete row");
        self.batch_update(json!({
            "deleteDimension": { "range": row_span(worksheet, row) }
        }))
        .await
    }

    async fn get_values(&self, worksheet: &Worksheet, range: &str) -> Result<Vec<Row>, BackendError> {
        debug!(worksheet = %worksheet.title, range, "sheets: read range");
        let url = self.values_url(worksheet, range)?;
        let resp = self.http.get(url).bearer_auth(&self.token.0).send().await?;
        let body: ValueRange = Self::check(resp).await?.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn put_values(&self, worksheet: &Worksheet, range: &str, rows: &[Row]) -> Result<(), BackendError> {
        debug!(worksheet = %worksheet.title, range, rows = rows.len(), "sheets: write range");
        let url = self.values_url(worksheet, range)?;
        // RAW keeps date keys as literal text so resume cursors read back verbatim.
        let resp = self
            .http
            .put(url)
            .bearer_auth(&self.token.0)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": a1_range(&worksheet.title, range),
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GoogleSheetsBackend {
        GoogleSheetsBackend::new("sheet-123", AccessToken::new("tok")).unwrap()
    }

    #[test]
    fn test_a1_range_quotes_title() {
        assert_eq!(a1_range("Income", "3:3"), "'Income'!3:3");
        assert_eq!(a1_range("Bob's", "A1"), "'Bob''s'!A1");
    }

    #[test]
    fn test_values_url_encodes_range() {
        let ws = Worksheet {
            id: 7,
            title: "My Income".to_string(),
        };
        let url = backend().values_url(&ws, "A2").unwrap();
        assert!(url.as_str().starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/"));
        assert!(url.as_str().contains("My%20Income"));
    }

    #[test]
    fn test_batch_update_url() {
        let url = backend().url(&["v4", "spreadsheets", "sheet-123:batchUpdate"]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/sheet-123:batchUpdate");
    }

    #[test]
    fn test_row_span_is_zero_based() {
        let ws = Worksheet {
            id: 42,
            title: "Expenses".to_string(),
        };
        let span = row_span(&ws, 3);
        assert_eq!(span["startIndex"], 2);
        assert_eq!(span["endIndex"], 3);
        assert_eq!(span["sheetId"], 42);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        assert_eq!(format!("{:?}", AccessToken::new("secret")), "AccessToken(***)");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = GoogleSheetsBackend::with_base_url("not a url", "x", AccessToken::new("t"))
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::InvalidEndpoint(_)));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const VALUES_PATH: &str = r"^/v4/spreadsheets/sheet-123/values/'Income'!.+$";

        fn income() -> Worksheet {
            Worksheet {
                id: 7,
                title: "Income".to_string(),
            }
        }

        fn against(server: &MockServer) -> GoogleSheetsBackend {
            GoogleSheetsBackend::with_base_url(&server.uri(), "sheet-123", AccessToken::new("tok")).unwrap()
        }

        async fn mount_meta(server: &MockServer) {
            Mock::given(method("GET"))
                .and(path("/v4/spreadsheets/sheet-123"))
                .and(query_param("fields", "sheets.properties(sheetId,title)"))
                .and(header("authorization", "Bearer tok"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "sheets": [
                        { "properties": { "sheetId": 0, "title": "Expenses" } },
                        { "properties": { "sheetId": 7, "title": "Income" } },
                    ]
                })))
                .mount(server)
                .await;
        }

        #[tokio::test]
        async fn test_worksheet_lookup_by_title() {
            let server = MockServer::start().await;
            mount_meta(&server).await;

            let ws = against(&server).worksheet("Income").await.unwrap();
            assert_eq!(ws, income());
        }

        #[tokio::test]
        async fn test_worksheet_not_found() {
            let server = MockServer::start().await;
            mount_meta(&server).await;

            let err = against(&server).worksheet("Savings").await.unwrap_err();
            assert!(matches!(err, BackendError::WorksheetNotFound(ref n) if n == "Savings"));
        }

        #[tokio::test]
        async fn test_429_is_rate_limited() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
                .mount(&server)
                .await;

            let err = against(&server).worksheet("Income").await.unwrap_err();
            assert!(err.is_rate_limited());
        }

        #[tokio::test]
        async fn test_server_error_carries_status_and_body() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
                .mount(&server)
                .await;

            let err = against(&server).delete_row(&income(), 4).await.unwrap_err();
            match err {
                BackendError::Api { status, message } => {
                    assert_eq!(status, 500);
                    assert_eq!(message, "backend down");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_insert_blank_row_request() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v4/spreadsheets/sheet-123:batchUpdate"))
                .and(header("authorization", "Bearer tok"))
                .and(body_json(json!({
                    "requests": [{
                        "insertDimension": {
                            "range": { "sheetId": 7, "dimension": "ROWS", "startIndex": 2, "endIndex": 3 },
                            "inheritFromBefore": true,
                        }
                    }]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "replies": [{}] })))
                .expect(1)
                .mount(&server)
                .await;

            against(&server).insert_blank_row(&income(), 3).await.unwrap();
        }

        #[tokio::test]
        async fn test_insert_at_top_does_not_inherit() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(body_json(json!({
                    "requests": [{
                        "insertDimension": {
                            "range": { "sheetId": 7, "dimension": "ROWS", "startIndex": 0, "endIndex": 1 },
                            "inheritFromBefore": false,
                        }
                    }]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .expect(1)
                .mount(&server)
                .await;

            against(&server).insert_blank_row(&income(), 1).await.unwrap();
        }

        #[tokio::test]
        async fn test_put_values_writes_raw_rows() {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(path_regex(VALUES_PATH))
                .and(query_param("valueInputOption", "RAW"))
                .and(body_json(json!({
                    "range": "'Income'!A3:B3",
                    "majorDimension": "ROWS",
                    "values": [["2024-03-01T09:15:00", "TOPUP"]],
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updatedRows": 1 })))
                .expect(1)
                .mount(&server)
                .await;

            let rows = vec![vec!["2024-03-01T09:15:00".to_string(), "TOPUP".to_string()]];
            against(&server).put_values(&income(), "A3:B3", &rows).await.unwrap();
        }

        #[tokio::test]
        async fn test_get_values_stringifies_cells() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path_regex(VALUES_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "range": "'Income'!A2:C3",
                    "values": [["2024-03-01T09:15:00", 100, null], ["x"]],
                })))
                .mount(&server)
                .await;

            let rows = against(&server).get_values(&income(), "A2:C3").await.unwrap();
            assert_eq!(rows, vec![vec!["2024-03-01T09:15:00", "100", ""], vec!["x"]]);
        }

        #[tokio::test]
        async fn test_get_values_empty_range() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path_regex(VALUES_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "range": "'Income'!A2" })))
                .mount(&server)
                .await;

            let rows = against(&server).get_values(&income(), "A2").await.unwrap();
            assert!(rows.is_empty());
        }
    }
}
