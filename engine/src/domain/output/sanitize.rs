//! CSV cell quoting

/// Prepare a value for a CSV cell
///
/// Absent values become empty. The value is trimmed, every `"` is doubled,
/// and the result is wrapped in double quotes only if it contains a comma.
pub fn sanitize_csv<'a>(value: impl Into<Option<&'a str>>) -> String {
    let escaped = value.into().unwrap_or("").trim().replace('"', "\"\"");
    if escaped.contains(',') {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}
