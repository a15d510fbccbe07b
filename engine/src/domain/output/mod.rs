//! Result serialization
//!
//! Point rows are encoded in one of three formats:
//! - `csv` - Tabular CSV with a `_time` header
//! - `weirdcsv` - Annotated CSV with group/datatype/default header lines
//! - `lineprotocol` - One line protocol entry per row
//!
//! Table rows (Flux) always use the raw tabular encoding in `table_rows`.
//!
//! All encoders make one forward pass over the stream and keep only the
//! discovered columns and the emitted lines; the output is joined once at
//! the end.

mod annotated;
mod line_protocol;
mod sanitize;
mod schema;
mod table_rows;
mod tabular;

use std::fmt;
use std::str::FromStr;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use annotated::AnnotatedCsv;
use line_protocol::LineProtocol;
use tabular::TabularCsv;

pub use sanitize::sanitize_csv;
pub use schema::{FieldDefinition, SchemaDiscovery, render_field};
pub use table_rows::serialize_table_rows;

use crate::data::{ClientError, PointStream, PointValues};

/// Prefix of the message returned for an unknown format name
pub const UNKNOWN_FORMAT_PREFIX: &str = "Output format not recognized:";

// =============================================================================
// Output format
// =============================================================================

/// Encoding for point rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "weirdcsv")]
    AnnotatedCsv,
    #[serde(rename = "lineprotocol")]
    LineProtocol,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::AnnotatedCsv => "weirdcsv",
            Self::LineProtocol => "lineprotocol",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    /// Case-insensitive; the error is the text shown to the user
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "weirdcsv" => Ok(Self::AnnotatedCsv),
            "lineprotocol" => Ok(Self::LineProtocol),
            _ => Err(format!("{}{}", UNKNOWN_FORMAT_PREFIX, s)),
        }
    }
}

// =============================================================================
// Row cap
// =============================================================================

/// Maximum number of emitted rows; zero or negative is unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCap(i64);

impl RowCap {
    pub fn new(max_rows: i64) -> Self {
        Self(max_rows)
    }

    pub fn is_unlimited(&self) -> bool {
        self.0 <= 0
    }

    /// Whether `emitted` rows exhaust the cap
    pub fn reached(&self, emitted: usize) -> bool {
        !self.is_unlimited() && i64::try_from(emitted).unwrap_or(i64::MAX) >= self.0
    }
}

// =============================================================================
// Point encoding
// =============================================================================

/// Per-format row and header rendering
trait PointEncoder {
    /// Render one row, updating any discovered schema
    fn encode_row(&mut self, row: &PointValues) -> String;

    /// Header lines for everything seen so far
    fn header(&self) -> Vec<String>;
}

/// Drain a point stream into text in `format`
pub async fn serialize_points(
    rows: PointStream,
    format: OutputFormat,
    max_rows: i64,
) -> Result<String, ClientError> {
    let cap = RowCap::new(max_rows);
    match format {
        OutputFormat::Csv => drain(TabularCsv::default(), rows, cap).await,
        OutputFormat::AnnotatedCsv => drain(AnnotatedCsv::default(), rows, cap).await,
        OutputFormat::LineProtocol => drain(LineProtocol, rows, cap).await,
    }
}

async fn drain<E: PointEncoder>(
    mut encoder: E,
    mut rows: PointStream,
    cap: RowCap,
) -> Result<String, ClientError> {
    let mut lines = Vec::new();
    while let Some(row) = rows.next().await {
        lines.push(encoder.encode_row(&row?));
        if cap.reached(lines.len()) {
            tracing::debug!(rows = lines.len(), "Row limit reached");
            break;
        }
    }

    tracing::trace!(rows = lines.len(), "Serialized point rows");
    let mut output = encoder.header();
    output.extend(lines);
    Ok(output.join("\n"))
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::data::FieldValue;

    fn points(n: usize) -> PointStream {
        let rows: Vec<Result<PointValues, ClientError>> = (0..n)
            .map(|i| {
                Ok(PointValues::new()
                    .with_timestamp(i as i64)
                    .with_tag("t1", "x")
                    .with_field("f1", FieldValue::Float(i as f64 + 0.5))
                    .with_field("f2", FieldValue::Integer(i as i64)))
            })
            .collect();
        Box::pin(stream::iter(rows))
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("WeirdCSV".parse::<OutputFormat>(), Ok(OutputFormat::AnnotatedCsv));
        assert_eq!(
            "lineProtocol".parse::<OutputFormat>(),
            Ok(OutputFormat::LineProtocol)
        );
        assert_eq!(
            "xml".parse::<OutputFormat>(),
            Err("Output format not recognized:xml".to_string())
        );
        assert_eq!(OutputFormat::AnnotatedCsv.to_string(), "weirdcsv");
    }

    #[test]
    fn test_row_cap() {
        assert!(!RowCap::new(0).reached(1_000_000));
        assert!(!RowCap::new(-5).reached(1));
        assert!(!RowCap::new(3).reached(2));
        assert!(RowCap::new(3).reached(3));
    }

    #[tokio::test]
    async fn test_csv_cap_stops_after_limit() {
        let text = serialize_points(points(5), OutputFormat::Csv, 3).await.unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "_time,\tt1,\tf1,\tf2");
        assert_eq!(lines[3], "2,\tx,\t2.5,\t2");
    }

    #[tokio::test]
    async fn test_csv_zero_rows_has_header() {
        let text = serialize_points(points(0), OutputFormat::Csv, 0).await.unwrap();
        assert_eq!(text, "_time");
    }

    #[tokio::test]
    async fn test_annotated_always_four_header_lines() {
        let empty = serialize_points(points(0), OutputFormat::AnnotatedCsv, 0)
            .await
            .unwrap();
        assert_eq!(empty.split('\n').count(), 4);

        let two = serialize_points(points(2), OutputFormat::AnnotatedCsv, 0)
            .await
            .unwrap();
        let lines: Vec<&str> = two.split('\n').collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "#group,false,false,true,true,true,false,false");
        assert_eq!(lines[1], "#datatype,string,long,dateTime,string,string,float,integer");
        assert_eq!(lines[4], ",,0,0,measurement,x,0.5,0");
    }

    #[tokio::test]
    async fn test_line_protocol_no_header() {
        let text = serialize_points(points(2), OutputFormat::LineProtocol, 0)
            .await
            .unwrap();
        assert_eq!(
            text,
            "measurement,t1=x f1=0.5,f2=0 0\nmeasurement,t1=x f1=1.5,f2=1 1"
        );
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let rows: Vec<Result<PointValues, ClientError>> = vec![
            Ok(PointValues::new().with_timestamp(1)),
            Err(ClientError::backend("query timed out")),
        ];
        let err = serialize_points(Box::pin(stream::iter(rows)), OutputFormat::Csv, 0)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "query timed out");
    }
}
