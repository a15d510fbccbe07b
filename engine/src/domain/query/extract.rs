//! Inline parameter extraction
//!
//! Parameters are declared on their own line:
//!
//! ```text
//! #$host = server-a
//! #$limit:number = 10
//! #$verbose:boolean = yes
//! SELECT * FROM cpu WHERE host = $host LIMIT $limit
//! ```
//!
//! Directive lines are removed from the query text; every other line is kept
//! (trimmed) in its original order.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::parameter::{ParamType, QueryParameter};

/// Query text with its inline parameters removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedQuery {
    pub query_text: String,
    /// In declaration order, repeats included
    pub parameters: Vec<QueryParameter>,
}

impl ExtractedQuery {
    /// Latest declaration of `name`
    pub fn parameter(&self, name: &str) -> Option<&QueryParameter> {
        self.parameters.iter().rev().find(|p| p.name == name)
    }
}

/// Directive pattern on a single trimmed line
fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^#\$(\w+)(?::(string|number|boolean))?\s*=(.*)$").expect("Invalid regex")
    })
}

/// Split raw query text into clean text and parameters
pub fn extract_query(raw_query: &str) -> ExtractedQuery {
    let mut parameters = Vec::new();
    let mut lines = Vec::new();

    for line in raw_query.split('\n').map(str::trim) {
        match directive_regex().captures(line) {
            Some(caps) => {
                let parameter = parameter_from(&caps);
                if parameter.is_valid() {
                    parameters.push(parameter);
                }
            }
            None => lines.push(line),
        }
    }

    tracing::trace!(parameters = parameters.len(), "Extracted query parameters");
    ExtractedQuery {
        query_text: lines.join("\n"),
        parameters,
    }
}

fn parameter_from(caps: &Captures<'_>) -> QueryParameter {
    let name = caps.get(1).map_or("", |m| m.as_str()).trim();
    let param_type = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(ParamType::String);
    let raw_value = caps.get(3).map_or("", |m| m.as_str());
    QueryParameter::new(name, param_type, raw_value)
}
