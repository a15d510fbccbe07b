//! Query text handling
//!
//! - `extract` - Strip `#$name[:type] = value` directives from query text
//! - `parameter` - Typed parameters and value coercion
//! - `highlight` - Directive positions for editor decorations

mod extract;
mod highlight;
mod parameter;

pub use extract::{ExtractedQuery, extract_query};
pub use highlight::{ParameterSpan, locate_parameters, position_at};
pub use parameter::{ParamType, QueryParameter, coerce_value, to_query_params};
