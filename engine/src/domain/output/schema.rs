//! Incremental column discovery for point rows
//!
//! Columns are registered the first time a row reports them, tags before
//! fields within a row. A field's kind is fixed by its first occurrence and
//! later values are rendered as that kind.

use std::collections::HashMap;

use super::sanitize::sanitize_csv;
use crate::data::types::format_float;
use crate::data::{FieldKind, FieldValue, PointValues};

/// A discovered column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub is_tag: bool,
    /// `None` for tags
    pub kind: Option<FieldKind>,
}

/// Ordered columns with a name lookup; append-only
#[derive(Debug, Default)]
pub struct SchemaDiscovery {
    columns: Vec<FieldDefinition>,
    lookup: HashMap<String, usize>,
}

impl SchemaDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register any columns of `row` not seen before
    pub fn observe(&mut self, row: &PointValues) {
        for (name, _) in row.tags() {
            self.register(name, true, None);
        }
        for (name, value) in row.fields() {
            self.register(name, false, Some(value.kind()));
        }
    }

    fn register(&mut self, name: &str, is_tag: bool, kind: Option<FieldKind>) {
        if self.lookup.contains_key(name) {
            return;
        }
        self.lookup.insert(name.to_string(), self.columns.len());
        self.columns.push(FieldDefinition {
            name: name.to_string(),
            is_tag,
            kind,
        });
    }

    pub fn columns(&self) -> &[FieldDefinition] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.lookup.get(name).map(|&i| &self.columns[i])
    }

    /// One cell per discovered column, in column order
    ///
    /// Tags are written raw; fields by their fixed kind.
    pub fn cells<'a>(&'a self, row: &'a PointValues) -> impl Iterator<Item = String> + 'a {
        self.columns.iter().map(move |column| {
            if column.is_tag {
                row.tag(&column.name).unwrap_or("").to_string()
            } else {
                render_field(row.field(&column.name), column.kind)
            }
        })
    }
}

/// Render a field value as `kind`
///
/// Numeric and boolean kinds use plain conversion; values that cannot be
/// read as the kind, and missing values, render empty. Any other kind is
/// read as text and sanitized.
pub fn render_field(value: Option<&FieldValue>, kind: Option<FieldKind>) -> String {
    // Missing values are empty cells rather than the literal `undefined`.
    let Some(value) = value else {
        return String::new();
    };
    match kind {
        Some(FieldKind::Boolean) => value.as_bool().map(|b| b.to_string()).unwrap_or_default(),
        Some(FieldKind::Float) => value.as_float().map(format_float).unwrap_or_default(),
        Some(FieldKind::Integer) => value.as_integer().map(|i| i.to_string()).unwrap_or_default(),
        Some(FieldKind::UInteger) => value
            .as_uinteger()
            .map(|u| u.to_string())
            .unwrap_or_default(),
        Some(FieldKind::String) | None => sanitize_csv(value.as_text().as_str()),
    }
}

/// Timestamp cell; empty when the row has none
pub fn render_timestamp(row: &PointValues) -> String {
    row.timestamp().map(|t| t.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_order_tags_before_fields() {
        let mut schema = SchemaDiscovery::new();
        schema.observe(
            &PointValues::new()
                .with_field("f1", FieldValue::Float(1.0))
                .with_tag("t1", "a"),
        );
        schema.observe(
            &PointValues::new()
                .with_tag("t2", "b")
                .with_field("f2", FieldValue::Integer(2))
                .with_field("f1", FieldValue::Float(3.0)),
        );

        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["t1", "f1", "t2", "f2"]);
        assert!(schema.get("t1").unwrap().is_tag);
        assert_eq!(schema.get("t1").unwrap().kind, None);
        assert_eq!(schema.get("f2").unwrap().kind, Some(FieldKind::Integer));
    }

    #[test]
    fn test_kind_fixed_by_first_occurrence() {
        let mut schema = SchemaDiscovery::new();
        let first = PointValues::new().with_field("v", FieldValue::Integer(1));
        let second = PointValues::new().with_field("v", FieldValue::Float(2.0));
        schema.observe(&first);
        schema.observe(&second);

        assert_eq!(schema.get("v").unwrap().kind, Some(FieldKind::Integer));
        let cells: Vec<String> = schema.cells(&second).collect();
        assert_eq!(cells, vec![""]);
    }

    #[test]
    fn test_cells_missing_values_are_empty() {
        let mut schema = SchemaDiscovery::new();
        schema.observe(
            &PointValues::new()
                .with_tag("host", "a,b")
                .with_field("msg", FieldValue::String("x,y".into())),
        );
        let row = PointValues::new();
        let cells: Vec<String> = schema.cells(&row).collect();
        assert_eq!(cells, vec!["", ""]);
    }

    #[test]
    fn test_render_field_by_kind() {
        assert_eq!(
            render_field(Some(&FieldValue::Boolean(false)), Some(FieldKind::Boolean)),
            "false"
        );
        assert_eq!(
            render_field(Some(&FieldValue::Float(12.5)), Some(FieldKind::Float)),
            "12.5"
        );
        assert_eq!(
            render_field(Some(&FieldValue::UInteger(7)), Some(FieldKind::UInteger)),
            "7"
        );
        assert_eq!(
            render_field(Some(&FieldValue::String(" a,\"b\" ".into())), Some(FieldKind::String)),
            "\"a,\"\"b\"\"\""
        );
        assert_eq!(render_field(None, Some(FieldKind::Float)), "");
    }

    #[test]
    fn test_render_timestamp() {
        assert_eq!(render_timestamp(&PointValues::new().with_timestamp(42)), "42");
        assert_eq!(render_timestamp(&PointValues::new()), "");
    }
}
