//! Point-row client over the v3 query API
//!
//! `POST /api/v3/query_sql` and `/api/v3/query_influxql` return one JSON
//! object per line when asked for `jsonl`. The wire format carries no
//! tag/field distinction, so every non-time column becomes a field whose kind
//! follows the JSON value.

use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use futures::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};

use super::decode::LineBuffer;
use super::{check_status, endpoint};
use crate::data::client::{PointClient, PointQueryOptions, PointStream, QueryParams};
use crate::data::error::ClientError;
use crate::data::types::{FieldValue, PointValues, QueryType, ServerDetails};

const SQL_PATH: &str = "/api/v3/query_sql";
const INFLUXQL_PATH: &str = "/api/v3/query_influxql";

/// Column holding the row timestamp
const TIME_COLUMN: &str = "time";

/// Column InfluxQL adds to name the source measurement
const MEASUREMENT_COLUMN: &str = "iox::measurement";

#[derive(Serialize)]
struct QueryRequest<'a> {
    db: &'a str,
    q: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a QueryParams>,
}

pub(super) struct HttpPointClient {
    http: reqwest::Client,
    server: ServerDetails,
}

impl HttpPointClient {
    pub(super) fn new(http: reqwest::Client, server: ServerDetails) -> Self {
        Self { http, server }
    }
}

#[async_trait]
impl PointClient for HttpPointClient {
    async fn query_points(
        &self,
        query: &str,
        database: &str,
        options: PointQueryOptions,
    ) -> Result<PointStream, ClientError> {
        let path = match options.query_type {
            QueryType::Sql => SQL_PATH,
            QueryType::InfluxQl => INFLUXQL_PATH,
        };
        let url = endpoint(&self.server.address, path)?;
        tracing::debug!(
            url = %url,
            database,
            params = options.params.as_ref().map_or(0, |p| p.len()),
            "Sending point query"
        );

        let request = QueryRequest {
            db: database,
            q: query,
            format: "jsonl",
            params: options.params.as_ref(),
        };
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.server.token)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let mut body = response.bytes_stream();

        Ok(Box::pin(stream! {
            let mut lines = LineBuffer::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ClientError::from(e));
                        return;
                    }
                };
                for line in lines.push(&chunk) {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let row = parse_point_line(&line);
                    let failed = row.is_err();
                    yield row;
                    if failed {
                        return;
                    }
                }
            }
            if let Some(line) = lines.finish() {
                if !line.trim().is_empty() {
                    yield parse_point_line(&line);
                }
            }
        }))
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        tracing::trace!(address = %self.server.address, "Closing point client");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http-v3"
    }
}

/// Decode one JSON line into a point row
pub fn parse_point_line(line: &str) -> Result<PointValues, ClientError> {
    let object: Map<String, Value> = serde_json::from_str(line)?;
    let mut row = PointValues::new();

    for (name, value) in object {
        if name == TIME_COLUMN {
            row.set_timestamp(parse_timestamp(&value)?);
            continue;
        }
        if name == MEASUREMENT_COLUMN {
            continue;
        }
        if let Some(field) = field_value(value) {
            row.set_field(name, field);
        }
    }
    Ok(row)
}

fn field_value(value: Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Boolean(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Integer(i))
            } else if let Some(u) = n.as_u64() {
                Some(FieldValue::UInteger(u))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        Value::String(s) => Some(FieldValue::String(s)),
        other => Some(FieldValue::String(other.to_string())),
    }
}

/// Timestamp in nanoseconds. Accepts RFC 3339, zone-less ISO 8601 (read as
/// UTC), or an integer already in nanoseconds.
fn parse_timestamp(value: &Value) -> Result<Option<i64>, ClientError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ClientError::decode(format!("invalid timestamp: {}", n))),
        Value::String(s) => {
            let nanos = DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp_nanos_opt())
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(|dt| dt.and_utc().timestamp_nanos_opt())
                })
                .map_err(|e| ClientError::decode(format!("invalid timestamp '{}': {}", s, e)))?;
            nanos
                .map(Some)
                .ok_or_else(|| ClientError::decode(format!("timestamp out of range: {}", s)))
        }
        other => Err(ClientError::decode(format!("invalid timestamp: {}", other))),
    }
}
