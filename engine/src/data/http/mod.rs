//! HTTP client backend
//!
//! - Point queries (SQL, InfluxQL) go to the v3 JSON Lines endpoints
//! - Table queries (Flux) go to the v2 annotated CSV endpoint
//!
//! Both stream the response body, so rows are decoded as bytes arrive.

mod decode;
mod points;
mod tables;

use std::time::Duration;

pub use points::parse_point_line;
pub use tables::AnnotatedCsvReader;

use points::HttpPointClient;
use tables::HttpTableClient;

use super::client::{ClientFactory, PointClient, TableClient};
use super::error::ClientError;
use super::types::ServerDetails;

/// Factory for HTTP-backed clients sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    http: reqwest::Client,
}

impl HttpClientFactory {
    /// Build a factory whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("querypad/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    fn validate(server: &ServerDetails) -> Result<(), ClientError> {
        if server.address.trim().is_empty() {
            return Err(ClientError::InvalidConnection(
                "server address is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ClientFactory for HttpClientFactory {
    fn point_client(&self, server: &ServerDetails) -> Result<Box<dyn PointClient>, ClientError> {
        Self::validate(server)?;
        Ok(Box::new(HttpPointClient::new(
            self.http.clone(),
            server.clone(),
        )))
    }

    fn table_client(&self, server: &ServerDetails) -> Result<Box<dyn TableClient>, ClientError> {
        Self::validate(server)?;
        Ok(Box::new(HttpTableClient::new(
            self.http.clone(),
            server.clone(),
        )))
    }
}

/// Join a base address and an API path
fn endpoint(address: &str, path: &str) -> Result<reqwest::Url, ClientError> {
    let joined = format!("{}{}", address.trim().trim_end_matches('/'), path);
    reqwest::Url::parse(&joined)
        .map_err(|e| ClientError::InvalidConnection(format!("'{}': {}", address, e)))
}

/// Turn a non-success response into a status error carrying the body text
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body.trim().to_string()
    };
    tracing::debug!(status = status.as_u16(), message = %message, "Query rejected by server");
    Err(ClientError::status(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::DialectGeneration;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let url = endpoint("http://localhost:8086/", "/api/v2/query").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8086/api/v2/query");
    }

    #[test]
    fn test_endpoint_rejects_relative_address() {
        let err = endpoint("not a url", "/api/v2/query").unwrap_err();
        assert!(matches!(err, ClientError::InvalidConnection(_)));
    }

    #[test]
    fn test_factory_rejects_empty_address() {
        let factory = HttpClientFactory::new(Duration::from_secs(5)).unwrap();
        let server = ServerDetails::new("  ", "token", "db", "org");
        let err = factory.connect(&server, DialectGeneration::Point).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConnection(_)));
    }

    #[test]
    fn test_factory_builds_both_shapes() {
        let factory = HttpClientFactory::new(Duration::from_secs(5)).unwrap();
        let server = ServerDetails::new("http://localhost:8181", "token", "db", "org");
        let points = factory.connect(&server, DialectGeneration::Point).unwrap();
        assert_eq!(points.backend_name(), "http-v3");
        let tables = factory.connect(&server, DialectGeneration::Table).unwrap();
        assert_eq!(tables.backend_name(), "http-v2");
    }
}
