//! Table-row client over the v2 Flux query API
//!
//! `POST /api/v2/query?org=<org>` answers with annotated CSV. Each result
//! table is a block of annotation rows, one header row, then data rows; blocks
//! are separated by an empty line. The first cell of every row is the
//! annotation column and is not part of the table.

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;

use super::decode::CsvRecordBuffer;
use super::{check_status, endpoint};
use crate::data::client::{TableClient, TableRowStream};
use crate::data::error::ClientError;
use crate::data::types::{ServerDetails, TableColumn, TableMeta, TableRow};

const QUERY_PATH: &str = "/api/v2/query";

pub(super) struct HttpTableClient {
    http: reqwest::Client,
    server: ServerDetails,
}

impl HttpTableClient {
    pub(super) fn new(http: reqwest::Client, server: ServerDetails) -> Self {
        Self { http, server }
    }
}

#[async_trait]
impl TableClient for HttpTableClient {
    async fn iterate_rows(&self, query: &str) -> Result<TableRowStream, ClientError> {
        let mut url = endpoint(&self.server.address, QUERY_PATH)?;
        url.query_pairs_mut().append_pair("org", &self.server.org_id);
        tracing::debug!(url = %url, org = %self.server.org_id, "Sending Flux query");

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Token {}", self.server.token))
            .header("Accept", "application/csv")
            .json(&json!({
                "query": query,
                "type": "flux",
                "dialect": {
                    "header": true,
                    "annotations": ["datatype"],
                    "delimiter": ",",
                },
            }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let mut body = response.bytes_stream();

        Ok(Box::pin(stream! {
            let mut records = CsvRecordBuffer::new();
            let mut reader = AnnotatedCsvReader::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ClientError::from(e));
                        return;
                    }
                };
                for record in records.push(&chunk) {
                    if let Some(row) = reader.accept(record) {
                        let failed = row.is_err();
                        yield row;
                        if failed {
                            return;
                        }
                    }
                }
            }
            if let Some(record) = records.finish() {
                if let Some(row) = reader.accept(record) {
                    yield row;
                }
            }
        }))
    }

    fn name(&self) -> &'static str {
        "http-v2"
    }
}

/// Turns annotated CSV records into table rows
#[derive(Debug, Default)]
pub struct AnnotatedCsvReader {
    data_types: Vec<String>,
    meta: Option<Arc<TableMeta>>,
}

impl AnnotatedCsvReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one record. Returns a row for data records, an error for an
    /// in-band error table, and `None` for structural records.
    pub fn accept(&mut self, record: Vec<String>) -> Option<Result<TableRow, ClientError>> {
        if record.iter().all(|cell| cell.is_empty()) {
            self.data_types.clear();
            self.meta = None;
            return None;
        }

        let mut cells = record.into_iter();
        let first = cells.next().unwrap_or_default();

        if first.starts_with('#') {
            if first == "#datatype" {
                self.data_types = cells.collect();
            }
            return None;
        }

        let rest: Vec<String> = cells.collect();
        let Some(meta) = self.meta.clone() else {
            let columns = rest
                .into_iter()
                .enumerate()
                .map(|(i, label)| TableColumn {
                    label,
                    data_type: self.data_types.get(i).cloned(),
                })
                .collect();
            self.meta = Some(Arc::new(TableMeta { columns }));
            return None;
        };

        if is_error_table(&meta) {
            let message = rest.into_iter().next().unwrap_or_default();
            return Some(Err(ClientError::backend(message)));
        }
        Some(Ok(TableRow { values: rest, meta }))
    }
}

/// The server reports query failures as a table with `error,reference` columns
fn is_error_table(meta: &TableMeta) -> bool {
    let labels: Vec<&str> = meta.columns.iter().map(|c| c.label.as_str()).collect();
    labels == ["error", "reference"]
}
