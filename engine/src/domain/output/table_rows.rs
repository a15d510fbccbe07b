//! Raw table rows from Flux queries
//!
//! Header comes from the first row's column labels; values are sanitized and
//! joined like tabular CSV.

use futures::StreamExt;

use super::RowCap;
use super::sanitize::sanitize_csv;
use super::tabular::SEPARATOR;
use crate::data::{ClientError, TableRowStream};

/// Drain a table-row stream into text
///
/// The header line is empty when no rows arrive.
pub async fn serialize_table_rows(
    mut rows: TableRowStream,
    max_rows: i64,
) -> Result<String, ClientError> {
    let cap = RowCap::new(max_rows);
    let mut header: Option<String> = None;
    let mut lines = Vec::new();

    while let Some(row) = rows.next().await {
        let row = row?;
        if header.is_none() {
            header = Some(
                row.meta
                    .columns
                    .iter()
                    .map(|c| sanitize_csv(c.label.as_str()))
                    .collect::<Vec<_>>()
                    .join(SEPARATOR),
            );
        }
        lines.push(
            row.values
                .iter()
                .map(|v| sanitize_csv(v.as_str()))
                .collect::<Vec<_>>()
                .join(SEPARATOR),
        );
        if cap.reached(lines.len()) {
            tracing::debug!(rows = lines.len(), "Row limit reached");
            break;
        }
    }

    tracing::trace!(rows = lines.len(), "Serialized table rows");
    let mut output = vec![header.unwrap_or_default()];
    output.extend(lines);
    Ok(output.join("\n"))
}
