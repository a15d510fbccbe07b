//! Client layer
//!
//! Provides execution backends for queries:
//! - `client` - Factory and execution handle traits
//! - `http` - InfluxDB HTTP APIs (v3 point rows, v2 Flux table rows)
//! - `memory` - Scripted in-memory rows for tests and embedding
//! - `types` - Rows, connection details, and query languages
//! - `error` - Error type shared by all backends
//!
//! ## Backend Support
//!
//! Backends implement [`ClientFactory`], which hands out an [`ExecutionHandle`]
//! holding either a [`PointClient`] or a [`TableClient`].

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use client::{
    ClientFactory, ExecutionHandle, PointClient, PointQueryOptions, PointStream, QueryParams,
    TableClient, TableRowStream,
};
pub use error::ClientError;
pub use http::HttpClientFactory;
pub use memory::{MemoryClientFactory, RecordedPointQuery};
pub use types::{
    DialectGeneration, FieldKind, FieldValue, ParamValue, PointValues, QueryLanguage, QueryType,
    ServerDetails, TableColumn, TableMeta, TableRow,
};
