//! Row and connection types shared by client backends and serializers

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// Connection descriptor
// =============================================================================

/// Connection details for one database server
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerDetails {
    /// Base URL, e.g. `https://us-east-1-1.aws.cloud2.influxdata.com`
    pub address: String,
    /// API token
    pub token: String,
    /// Bucket (v2) or database (v3) name
    pub bucket: String,
    /// Organization id, only used by table-row (Flux) queries
    pub org_id: String,
}

impl ServerDetails {
    pub fn new(
        address: impl Into<String>,
        token: impl Into<String>,
        bucket: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            bucket: bucket.into(),
            org_id: org_id.into(),
        }
    }
}

impl fmt::Debug for ServerDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerDetails")
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("org_id", &self.org_id)
            .finish()
    }
}

// =============================================================================
// Query language
// =============================================================================

/// Which execution capability a query language runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectGeneration {
    /// Typed point rows (SQL and InfluxQL)
    Point,
    /// Raw table rows (Flux)
    Table,
}

/// Query type passed to point-row clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Sql,
    #[serde(rename = "influxql")]
    InfluxQl,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::InfluxQl => "influxql",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing query language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    #[default]
    Sql,
    #[serde(rename = "influxql")]
    InfluxQl,
    Flux,
}

impl QueryLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::InfluxQl => "influxql",
            Self::Flux => "flux",
        }
    }

    pub fn generation(&self) -> DialectGeneration {
        match self {
            Self::Sql | Self::InfluxQl => DialectGeneration::Point,
            Self::Flux => DialectGeneration::Table,
        }
    }

    /// Query type for point-row execution; `None` for Flux
    pub fn query_type(&self) -> Option<QueryType> {
        match self {
            Self::Sql => Some(QueryType::Sql),
            Self::InfluxQl => Some(QueryType::InfluxQl),
            Self::Flux => None,
        }
    }

    /// Whether inline `#$name = value` parameters can be sent with this language
    pub fn supports_parameters(&self) -> bool {
        self.generation() == DialectGeneration::Point
    }
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "influxql" => Ok(Self::InfluxQl),
            "flux" => Ok(Self::Flux),
            _ => Err(format!(
                "Invalid query language '{}'. Valid options: sql, influxql, flux",
                s
            )),
        }
    }
}

// =============================================================================
// Query parameters
// =============================================================================

/// A typed value bound to a named query parameter
///
/// Serializes as a bare JSON value. Whole numbers go out as integers so
/// `LIMIT $n` style uses are accepted by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) if is_whole_i64(*n) => serializer.serialize_i64(*n as i64),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Finite, no fractional part, and inside the `i64` range
fn is_whole_i64(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_float(*n)),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

// =============================================================================
// Point rows
// =============================================================================

/// Kind tag carried by every field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Float,
    Integer,
    #[serde(rename = "uinteger")]
    UInteger,
    String,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::UInteger => "uinteger",
            Self::String => "string",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind-tagged field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Boolean(bool),
    Float(f64),
    Integer(i64),
    UInteger(u64),
    String(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Float(_) => FieldKind::Float,
            Self::Integer(_) => FieldKind::Integer,
            Self::UInteger(_) => FieldKind::UInteger,
            Self::String(_) => FieldKind::String,
        }
    }

    /// Read as boolean. Numbers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Float(f) => Some(*f != 0.0),
            Self::Integer(i) => Some(*i != 0),
            Self::UInteger(u) => Some(*u != 0),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::UInteger(u) => Some(*u as f64),
            Self::Boolean(_) => None,
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::UInteger(u) => i64::try_from(*u).ok(),
            Self::Float(_) | Self::Boolean(_) => None,
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_uinteger(&self) -> Option<u64> {
        match self {
            Self::UInteger(u) => Some(*u),
            Self::Integer(i) => u64::try_from(*i).ok(),
            Self::Float(_) | Self::Boolean(_) => None,
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Read as text; non-string kinds use their plain rendering
    pub fn as_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Integer(i) => write!(f, "{}", i),
            Self::UInteger(u) => write!(f, "{}", u),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Plain number rendering: `12.34`, `0`, `-95.2`, `NaN`, `Infinity`
///
/// Magnitudes of at least `1e21` or below `1e-6` switch to exponent form
/// with an explicit sign: `1e+21`, `1.5e-7`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if exp.starts_with('-') => format!("{}e{}", mantissa, exp),
            Some((mantissa, exp)) => format!("{}e+{}", mantissa, exp),
            None => formatted,
        };
    }
    value.to_string()
}

/// One observation from a point-row query
///
/// Tags and fields keep the order the backend reported them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointValues {
    timestamp: Option<i64>,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
}

impl PointValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, nanos: i64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_tag(name, value);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_timestamp(&mut self, nanos: Option<i64>) {
        self.timestamp = nanos;
    }

    /// Set a tag, replacing an existing value in place
    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.tags.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.tags.push((name, value)),
        }
    }

    /// Set a field, replacing an existing value in place
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Timestamp in nanoseconds since the Unix epoch
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(FieldValue::kind)
    }
}

// =============================================================================
// Table rows
// =============================================================================

/// Column metadata shared by every row of one result table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMeta {
    pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub label: String,
    /// Value from the `#datatype` annotation when the server sent one
    pub data_type: Option<String>,
}

impl TableMeta {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: labels
                .into_iter()
                .map(|label| TableColumn {
                    label: label.into(),
                    data_type: None,
                })
                .collect(),
        }
    }
}

/// One raw row from a table-row query
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub values: Vec<String>,
    pub meta: Arc<TableMeta>,
}
