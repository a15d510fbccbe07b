//! Line protocol (`lineprotocol`)
//!
//! `measurement,<tag>=<v>,... <field>=<v>,... <time>`, one line per row in
//! the row's own tag and field order. No header.

use super::PointEncoder;
use super::schema::{render_field, render_timestamp};
use crate::data::PointValues;

#[derive(Debug, Default)]
pub(super) struct LineProtocol;

impl PointEncoder for LineProtocol {
    fn encode_row(&mut self, row: &PointValues) -> String {
        let tags = row
            .tags()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(",");
        let fields = row
            .fields()
            .iter()
            .map(|(name, value)| format!("{}={}", name, render_field(Some(value), Some(value.kind()))))
            .collect::<Vec<_>>()
            .join(",");
        format!("measurement,{} {} {}", tags, fields, render_timestamp(row))
    }

    fn header(&self) -> Vec<String> {
        Vec::new()
    }
}
