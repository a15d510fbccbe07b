//! Query dispatch
//!
//! Runs one raw query end to end: extract parameters, check them against the
//! language, connect, serialize the rows, release the handle. Every outcome,
//! including failures, is returned as display text.

use crate::data::{
    ClientError, ClientFactory, DialectGeneration, ExecutionHandle, PointQueryOptions,
    QueryLanguage, QueryType, ServerDetails,
};

use super::output::{OutputFormat, serialize_points, serialize_table_rows};
use super::query::{ExtractedQuery, extract_query, to_query_params};

/// Returned when a Flux query declares inline parameters
pub const FLUX_QUERY_PARAMETER_ERROR: &str =
    "Flux queries are not compatable with named parameters.";

/// Returned when there is no server or nothing to run
pub const EMPTY_RESULT: &str = "Empty Result";

/// Returned for faults that carry no message
pub const GENERIC_ERROR: &str = "Error executing query";

/// How the rows of one query will be consumed
#[derive(Debug, Clone, Copy)]
enum Plan {
    Points {
        query_type: QueryType,
        format: OutputFormat,
    },
    Tables,
}

impl Plan {
    fn generation(&self) -> DialectGeneration {
        match self {
            Self::Points { .. } => DialectGeneration::Point,
            Self::Tables => DialectGeneration::Table,
        }
    }
}

/// Execute `raw_query` and return the text to display
///
/// `output_format` only applies to point languages; Flux results always use
/// the table-row encoding. `max_rows` of zero or less is unlimited.
pub async fn execute(
    server: Option<&ServerDetails>,
    raw_query: &str,
    language: QueryLanguage,
    factory: &dyn ClientFactory,
    output_format: &str,
    max_rows: i64,
) -> String {
    let extracted = extract_query(raw_query);

    if !language.supports_parameters() && !extracted.parameters.is_empty() {
        tracing::debug!(
            language = %language,
            parameters = extracted.parameters.len(),
            "Rejecting parameters for language without parameter support"
        );
        return FLUX_QUERY_PARAMETER_ERROR.to_string();
    }

    let Some(server) = server else {
        tracing::debug!("No server selected");
        return EMPTY_RESULT.to_string();
    };
    if extracted.query_text.is_empty() {
        return EMPTY_RESULT.to_string();
    }

    let plan = match language.query_type() {
        Some(query_type) => match output_format.parse::<OutputFormat>() {
            Ok(format) => Plan::Points { query_type, format },
            Err(message) => return message,
        },
        None => Plan::Tables,
    };

    tracing::debug!(
        address = %server.address,
        language = %language,
        max_rows,
        "Executing query"
    );

    let mut handle = match factory.connect(server, plan.generation()) {
        Ok(handle) => handle,
        Err(e) => return fault_text(&e),
    };

    let result = run(&handle, plan, server, &extracted, max_rows).await;

    if let Err(e) = handle.close().await {
        tracing::warn!(error = %e, backend = handle.backend_name(), "Failed to close client");
    }

    match result {
        Ok(text) => text,
        Err(e) => fault_text(&e),
    }
}

async fn run(
    handle: &ExecutionHandle,
    plan: Plan,
    server: &ServerDetails,
    extracted: &ExtractedQuery,
    max_rows: i64,
) -> Result<String, ClientError> {
    match (plan, handle) {
        (Plan::Points { query_type, format }, ExecutionHandle::Points(client)) => {
            let options = PointQueryOptions {
                query_type,
                params: to_query_params(&extracted.parameters),
            };
            let rows = client
                .query_points(&extracted.query_text, &server.bucket, options)
                .await?;
            serialize_points(rows, format, max_rows).await
        }
        (Plan::Tables, ExecutionHandle::Tables(client)) => {
            let rows = client.iterate_rows(&extracted.query_text).await?;
            serialize_table_rows(rows, max_rows).await
        }
        (_, handle) => Err(ClientError::backend(format!(
            "{} client cannot run this query",
            handle.backend_name()
        ))),
    }
}

fn fault_text(error: &ClientError) -> String {
    tracing::error!(error = %error, "Error executing query");
    let message = error.to_string();
    if message.trim().is_empty() {
        GENERIC_ERROR.to_string()
    } else {
        message
    }
}
