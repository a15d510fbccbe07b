//! Tabular CSV (`csv`)
//!
//! ```text
//! _time,\thost,\tusage
//! 1704067200000000000,\ta,\t0.5
//! ```

use super::PointEncoder;
use super::sanitize::sanitize_csv;
use super::schema::{SchemaDiscovery, render_timestamp};
use crate::data::PointValues;

pub(super) const SEPARATOR: &str = ",\t";

#[derive(Debug, Default)]
pub(super) struct TabularCsv {
    schema: SchemaDiscovery,
}

impl PointEncoder for TabularCsv {
    fn encode_row(&mut self, row: &PointValues) -> String {
        self.schema.observe(row);
        let mut cells = vec![render_timestamp(row)];
        cells.extend(self.schema.cells(row));
        cells.join(SEPARATOR)
    }

    fn header(&self) -> Vec<String> {
        let mut cells = vec!["_time".to_string()];
        cells.extend(
            self.schema
                .columns()
                .iter()
                .map(|c| sanitize_csv(c.name.as_str())),
        );
        vec![cells.join(SEPARATOR)]
    }
}
