//! In-memory client backend
//!
//! Serves scripted rows without a server, mainly as the test double for the
//! dispatcher:
//! - Rows are replayed lazily, one per poll
//! - Faults can be injected at connect, query start, mid-stream, or close
//! - Every connect, query, pulled row, and close is recorded

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::{
    ClientFactory, PointClient, PointQueryOptions, PointStream, TableClient, TableRowStream,
};
use super::error::ClientError;
use super::types::{PointValues, ServerDetails, TableRow};

#[derive(Debug, Clone, Default)]
struct Script {
    points: Vec<PointValues>,
    tables: Vec<TableRow>,
    connect_error: Option<String>,
    query_error: Option<String>,
    stream_error: Option<(usize, String)>,
    close_error: Option<String>,
}

/// A point query as the backend received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPointQuery {
    pub query: String,
    pub database: String,
    pub options: PointQueryOptions,
}

#[derive(Debug, Default)]
struct Calls {
    connects: usize,
    closes: usize,
    rows_pulled: usize,
    point_queries: Vec<RecordedPointQuery>,
    table_queries: Vec<String>,
}

/// Factory serving scripted rows
#[derive(Debug, Clone, Default)]
pub struct MemoryClientFactory {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Calls>>,
}

impl MemoryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by point queries
    pub fn with_points(self, rows: Vec<PointValues>) -> Self {
        self.script.lock().points = rows;
        self
    }

    /// Rows returned by table queries
    pub fn with_tables(self, rows: Vec<TableRow>) -> Self {
        self.script.lock().tables = rows;
        self
    }

    /// Fail when a handle is requested
    pub fn fail_connect(self, message: impl Into<String>) -> Self {
        self.script.lock().connect_error = Some(message.into());
        self
    }

    /// Fail when a query is started
    pub fn fail_query(self, message: impl Into<String>) -> Self {
        self.script.lock().query_error = Some(message.into());
        self
    }

    /// Yield an error after `rows` rows have been delivered
    pub fn fail_after(self, rows: usize, message: impl Into<String>) -> Self {
        self.script.lock().stream_error = Some((rows, message.into()));
        self
    }

    /// Fail when the handle is released
    pub fn fail_close(self, message: impl Into<String>) -> Self {
        self.script.lock().close_error = Some(message.into());
        self
    }

    pub fn connect_count(&self) -> usize {
        self.calls.lock().connects
    }

    pub fn close_count(&self) -> usize {
        self.calls.lock().closes
    }

    /// Rows handed to consumers across all queries
    pub fn rows_pulled(&self) -> usize {
        self.calls.lock().rows_pulled
    }

    pub fn point_queries(&self) -> Vec<RecordedPointQuery> {
        self.calls.lock().point_queries.clone()
    }

    pub fn table_queries(&self) -> Vec<String> {
        self.calls.lock().table_queries.clone()
    }

    fn begin_connect(&self) -> Result<Script, ClientError> {
        self.calls.lock().connects += 1;
        let script = self.script.lock().clone();
        match script.connect_error {
            Some(ref message) => Err(ClientError::backend(message.clone())),
            None => Ok(script),
        }
    }
}

impl ClientFactory for MemoryClientFactory {
    fn point_client(&self, server: &ServerDetails) -> Result<Box<dyn PointClient>, ClientError> {
        tracing::trace!(address = %server.address, "Creating memory point client");
        let script = self.begin_connect()?;
        Ok(Box::new(MemoryPointClient {
            script,
            calls: self.calls.clone(),
            closed: false,
        }))
    }

    fn table_client(&self, server: &ServerDetails) -> Result<Box<dyn TableClient>, ClientError> {
        tracing::trace!(address = %server.address, "Creating memory table client");
        let script = self.begin_connect()?;
        Ok(Box::new(MemoryTableClient {
            script,
            calls: self.calls.clone(),
            closed: false,
        }))
    }
}

/// Replay rows one at a time, counting each delivery
fn replay<T: Send + 'static>(
    rows: Vec<T>,
    stream_error: Option<(usize, String)>,
    calls: Arc<Mutex<Calls>>,
) -> impl futures::Stream<Item = Result<T, ClientError>> + Send {
    let (fail_at, fail_message) = match stream_error {
        Some((after, message)) => (Some(after), Some(message)),
        None => (None, None),
    };
    stream! {
        for (index, row) in rows.into_iter().enumerate() {
            if fail_at == Some(index) {
                break;
            }
            calls.lock().rows_pulled += 1;
            yield Ok(row);
        }
        if let Some(message) = fail_message {
            yield Err(ClientError::backend(message));
        }
    }
}

struct MemoryPointClient {
    script: Script,
    calls: Arc<Mutex<Calls>>,
    closed: bool,
}

#[async_trait]
impl PointClient for MemoryPointClient {
    async fn query_points(
        &self,
        query: &str,
        database: &str,
        options: PointQueryOptions,
    ) -> Result<PointStream, ClientError> {
        if self.closed {
            return Err(ClientError::Closed);
        }
        self.calls.lock().point_queries.push(RecordedPointQuery {
            query: query.to_string(),
            database: database.to_string(),
            options,
        });
        if let Some(ref message) = self.script.query_error {
            return Err(ClientError::backend(message.clone()));
        }
        Ok(Box::pin(replay(
            self.script.points.clone(),
            self.script.stream_error.clone(),
            self.calls.clone(),
        )))
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.closed = true;
        self.calls.lock().closes += 1;
        match self.script.close_error {
            Some(ref message) => Err(ClientError::backend(message.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTableClient {
    script: Script,
    calls: Arc<Mutex<Calls>>,
    closed: bool,
}

#[async_trait]
impl TableClient for MemoryTableClient {
    async fn iterate_rows(&self, query: &str) -> Result<TableRowStream, ClientError> {
        if self.closed {
            return Err(ClientError::Closed);
        }
        self.calls.lock().table_queries.push(query.to_string());
        if let Some(ref message) = self.script.query_error {
            return Err(ClientError::backend(message.clone()));
        }
        Ok(Box::pin(replay(
            self.script.tables.clone(),
            self.script.stream_error.clone(),
            self.calls.clone(),
        )))
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.closed = true;
        self.calls.lock().closes += 1;
        match self.script.close_error {
            Some(ref message) => Err(ClientError::backend(message.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::data::types::{DialectGeneration, FieldValue, QueryType, TableMeta};

    fn server() -> ServerDetails {
        ServerDetails::new("http://localhost:8181", "token", "db", "org")
    }

    fn rows(n: usize) -> Vec<PointValues> {
        (0..n)
            .map(|i| {
                PointValues::new()
                    .with_timestamp(i as i64)
                    .with_field("value", FieldValue::Integer(i as i64))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_replays_point_rows_and_records_query() {
        let factory = MemoryClientFactory::new().with_points(rows(3));
        let mut handle = factory.connect(&server(), DialectGeneration::Point).unwrap();
        let crate::data::ExecutionHandle::Points(ref client) = handle else {
            panic!("expected point handle");
        };

        let options = PointQueryOptions {
            query_type: QueryType::Sql,
            params: None,
        };
        let stream = client.query_points("SELECT 1", "db", options).await.unwrap();
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 3);
        assert!(collected.iter().all(Result::is_ok));

        handle.close().await.unwrap();
        assert_eq!(factory.connect_count(), 1);
        assert_eq!(factory.close_count(), 1);
        assert_eq!(factory.rows_pulled(), 3);
        assert_eq!(factory.point_queries()[0].query, "SELECT 1");
        assert_eq!(factory.point_queries()[0].database, "db");
    }

    #[tokio::test]
    async fn test_stream_error_after_rows() {
        let factory = MemoryClientFactory::new()
            .with_points(rows(5))
            .fail_after(2, "stream broke");
        let client = factory.point_client(&server()).unwrap();
        let options = PointQueryOptions {
            query_type: QueryType::InfluxQl,
            params: None,
        };
        let collected: Vec<_> = client
            .query_points("q", "db", options)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(collected.len(), 3);
        assert!(collected[0].is_ok());
        assert!(collected[1].is_ok());
        assert_eq!(collected[2].as_ref().unwrap_err().to_string(), "stream broke");
    }

    #[tokio::test]
    async fn test_table_rows_and_close_failure() {
        let meta = Arc::new(TableMeta::from_labels(["_time", "_value"]));
        let factory = MemoryClientFactory::new()
            .with_tables(vec![TableRow {
                values: vec!["2024-01-01T00:00:00Z".into(), "1".into()],
                meta,
            }])
            .fail_close("already gone");
        let mut client = factory.table_client(&server()).unwrap();
        let collected: Vec<_> = client.iterate_rows("from()").await.unwrap().collect().await;
        assert_eq!(collected.len(), 1);
        assert_eq!(factory.table_queries(), vec!["from()".to_string()]);

        let err = client.close().await.unwrap_err();
        assert_eq!(err.to_string(), "already gone");
        assert!(matches!(
            client.iterate_rows("from()").await,
            Err(ClientError::Closed)
        ));
    }

    #[test]
    fn test_connect_failure_is_counted() {
        let factory = MemoryClientFactory::new().fail_connect("no route to host");
        let result = factory.connect(&server(), DialectGeneration::Table);
        assert_eq!(result.unwrap_err().to_string(), "no route to host");
        assert_eq!(factory.connect_count(), 1);
    }
}
