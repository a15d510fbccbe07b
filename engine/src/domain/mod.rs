//! Query domain logic
//!
//! - `query` - Inline parameter extraction, coercion, and highlighting
//! - `output` - Row stream serializers (csv, weirdcsv, lineprotocol, table rows)
//! - `dispatch` - End-to-end query execution returning display text

pub mod dispatch;
pub mod output;
pub mod query;

pub use dispatch::{EMPTY_RESULT, FLUX_QUERY_PARAMETER_ERROR, GENERIC_ERROR, execute};
pub use output::{OutputFormat, RowCap, sanitize_csv};
pub use query::{ExtractedQuery, ParamType, QueryParameter, extract_query, locate_parameters};
