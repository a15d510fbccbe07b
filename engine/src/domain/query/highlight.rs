//! Parameter spans for editor decorations
//!
//! Unlike extraction, this scans the document in place so the reported
//! byte ranges point into the original text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// A directive located in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpan {
    pub name: String,
    pub name_range: Range<usize>,
    /// Declared type keyword as written, if any
    pub type_name: Option<String>,
    pub type_range: Option<Range<usize>>,
    /// Trimmed value text
    pub value: String,
    pub value_range: Range<usize>,
}

fn document_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*#\$(\w+)(?::(string|number|boolean))?[ \t]*=(.*)$")
            .expect("Invalid regex")
    })
}

/// Find every parameter directive in `text`
pub fn locate_parameters(text: &str) -> Vec<ParameterSpan> {
    document_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            let value = caps.get(3)?;
            let raw = value.as_str();
            let leading = raw.len() - raw.trim_start().len();
            let trimmed = raw.trim();
            let start = value.start() + leading;

            Some(ParameterSpan {
                name: name.as_str().to_string(),
                name_range: name.range(),
                type_name: caps.get(2).map(|m| m.as_str().to_string()),
                type_range: caps.get(2).map(|m| m.range()),
                value: trimmed.to_string(),
                value_range: start..start + trimmed.len(),
            })
        })
        .collect()
}

/// Zero-based line and column (in characters) of a byte offset
pub fn position_at(text: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &text[..offset];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count())
}
