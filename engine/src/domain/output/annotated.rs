//! Annotated CSV (`weirdcsv`)
//!
//! Four header lines describe the columns: group flags, data types,
//! defaults, then labels. Every data row carries the fixed leading cells
//! `,,0,<time>,measurement`.

use super::PointEncoder;
use super::sanitize::sanitize_csv;
use super::schema::{SchemaDiscovery, render_timestamp};
use crate::data::PointValues;

#[derive(Debug, Default)]
pub(super) struct AnnotatedCsv {
    schema: SchemaDiscovery,
}

impl PointEncoder for AnnotatedCsv {
    fn encode_row(&mut self, row: &PointValues) -> String {
        self.schema.observe(row);
        let mut cells = vec![
            String::new(),
            String::new(),
            "0".to_string(),
            render_timestamp(row),
            "measurement".to_string(),
        ];
        cells.extend(self.schema.cells(row));
        cells.join(",")
    }

    fn header(&self) -> Vec<String> {
        let mut group = Vec::from(["#group", "false", "false", "true", "true"].map(String::from));
        let mut datatype =
            Vec::from(["#datatype", "string", "long", "dateTime", "string"].map(String::from));
        let mut defaults = Vec::from(["#default", "", "", "", ""].map(String::from));
        let mut labels = Vec::from(["", "result", "table", "_time", "_measurement"].map(String::from));

        for column in self.schema.columns() {
            group.push(column.is_tag.to_string());
            datatype.push(column.kind.map_or("string", |k| k.as_str()).to_string());
            defaults.push(String::new());
            labels.push(sanitize_csv(column.name.as_str()));
        }

        vec![
            group.join(","),
            datatype.join(","),
            defaults.join(","),
            labels.join(","),
        ]
    }
}
