//! Client factory and execution handle definitions
//!
//! Query execution runs on one of two capabilities:
//! - Point clients (SQL, InfluxQL) stream typed rows with tags and kind-tagged fields
//! - Table clients (Flux) stream raw string rows with shared column labels
//!
//! A [`ClientFactory`] hands out an [`ExecutionHandle`] wrapping exactly one of
//! them, selected by the dialect generation of the query.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::error::ClientError;
use super::types::{DialectGeneration, ParamValue, PointValues, QueryType, ServerDetails, TableRow};

/// Named parameters sent alongside a point query
pub type QueryParams = HashMap<String, ParamValue>;

/// Lazy, forward-only stream of point rows
pub type PointStream = Pin<Box<dyn Stream<Item = Result<PointValues, ClientError>> + Send>>;

/// Lazy, forward-only stream of table rows
pub type TableRowStream = Pin<Box<dyn Stream<Item = Result<TableRow, ClientError>> + Send>>;

/// Options for a point query
#[derive(Debug, Clone, PartialEq)]
pub struct PointQueryOptions {
    pub query_type: QueryType,
    /// `None` when the query declared no parameters
    pub params: Option<QueryParams>,
}

/// Point-row capability (SQL / InfluxQL)
#[async_trait]
pub trait PointClient: Send + Sync {
    /// Start a query and return its row stream
    async fn query_points(
        &self,
        query: &str,
        database: &str,
        options: PointQueryOptions,
    ) -> Result<PointStream, ClientError>;

    /// Release the client
    async fn close(&mut self) -> Result<(), ClientError>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}

/// Table-row capability (Flux)
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Start a query and return its row stream
    async fn iterate_rows(&self, query: &str) -> Result<TableRowStream, ClientError>;

    /// Release the client
    async fn close(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}

/// A connected client of one capability shape
pub enum ExecutionHandle {
    Points(Box<dyn PointClient>),
    Tables(Box<dyn TableClient>),
}

impl ExecutionHandle {
    pub fn generation(&self) -> DialectGeneration {
        match self {
            Self::Points(_) => DialectGeneration::Point,
            Self::Tables(_) => DialectGeneration::Table,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Points(client) => client.name(),
            Self::Tables(client) => client.name(),
        }
    }

    /// Release the underlying client
    pub async fn close(&mut self) -> Result<(), ClientError> {
        match self {
            Self::Points(client) => client.close().await,
            Self::Tables(client) => client.close().await,
        }
    }
}

impl std::fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("generation", &self.generation())
            .field("backend", &self.backend_name())
            .finish()
    }
}

/// Builds execution handles for a server
pub trait ClientFactory: Send + Sync {
    fn point_client(&self, server: &ServerDetails) -> Result<Box<dyn PointClient>, ClientError>;

    fn table_client(&self, server: &ServerDetails) -> Result<Box<dyn TableClient>, ClientError>;

    /// Build the handle matching a dialect generation
    fn connect(
        &self,
        server: &ServerDetails,
        generation: DialectGeneration,
    ) -> Result<ExecutionHandle, ClientError> {
        match generation {
            DialectGeneration::Point => Ok(ExecutionHandle::Points(self.point_client(server)?)),
            DialectGeneration::Table => Ok(ExecutionHandle::Tables(self.table_client(server)?)),
        }
    }
}
