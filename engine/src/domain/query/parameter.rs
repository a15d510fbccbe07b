//! Typed query parameters and value coercion

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{ParamValue, QueryParams};

/// Declared type of an inline parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            _ => Err(format!("unknown parameter type: {}", s)),
        }
    }
}

/// A named, typed value declared inline in a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub value: ParamValue,
}

impl QueryParameter {
    /// Build a parameter, coercing the raw text to the declared type
    pub fn new(name: impl Into<String>, param_type: ParamType, raw_value: &str) -> Self {
        Self {
            name: name.into(),
            param_type,
            value: coerce_value(raw_value, param_type),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Display for QueryParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} = {}", self.name, self.param_type, self.value)
    }
}

/// Convert raw directive text into a typed value
///
/// - `string`: the trimmed text
/// - `number`: numeric parse; empty text is `0`, anything unparsable is NaN
/// - `boolean`: true when the trimmed text is non-empty, so `false` is true
pub fn coerce_value(raw: &str, param_type: ParamType) -> ParamValue {
    let text = raw.trim();
    match param_type {
        ParamType::String => ParamValue::String(text.to_string()),
        ParamType::Number => ParamValue::Number(coerce_number(text)),
        ParamType::Boolean => ParamValue::Boolean(!text.is_empty()),
    }
}

fn coerce_number(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64);
        }
    }

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    // Rejects `inf`, `nan` and friends that `f64::from_str` would accept
    if unsigned
        .chars()
        .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// Build the name→value map sent with a point query
///
/// Later declarations of a name replace earlier ones. Returns `None` when
/// there are no parameters.
pub fn to_query_params(parameters: &[QueryParameter]) -> Option<QueryParams> {
    if parameters.is_empty() {
        return None;
    }
    let mut params = QueryParams::with_capacity(parameters.len());
    for parameter in parameters {
        params.insert(parameter.name.clone(), parameter.value.clone());
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_type_parse_case_insensitive() {
        assert_eq!("NUMBER".parse::<ParamType>(), Ok(ParamType::Number));
        assert_eq!("Boolean".parse::<ParamType>(), Ok(ParamType::Boolean));
        assert!("integer".parse::<ParamType>().is_err());
        assert_eq!(ParamType::default(), ParamType::String);
    }

    #[test]
    fn test_coerce_string_trims() {
        assert_eq!(
            coerce_value("  My String ", ParamType::String),
            ParamValue::String("My String".to_string())
        );
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_value(" 12.34 ", ParamType::Number), ParamValue::Number(12.34));
        assert_eq!(coerce_value("-4.5e2", ParamType::Number), ParamValue::Number(-450.0));
        assert_eq!(coerce_value("0x1A", ParamType::Number), ParamValue::Number(26.0));
        assert_eq!(coerce_value("", ParamType::Number), ParamValue::Number(0.0));
        assert_eq!(
            coerce_value("-Infinity", ParamType::Number),
            ParamValue::Number(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_coerce_number_not_a_number() {
        for text in ["abc", "inf", "nan", "1_000", "12px"] {
            match coerce_value(text, ParamType::Number) {
                ParamValue::Number(n) => assert!(n.is_nan(), "{} should be NaN", text),
                other => panic!("unexpected value {:?}", other),
            }
        }
    }

    #[test]
    fn test_coerce_boolean_is_non_empty() {
        assert_eq!(coerce_value("true ", ParamType::Boolean), ParamValue::Boolean(true));
        assert_eq!(coerce_value("false", ParamType::Boolean), ParamValue::Boolean(true));
        assert_eq!(coerce_value("   ", ParamType::Boolean), ParamValue::Boolean(false));
    }

    #[test]
    fn test_to_query_params_empty_is_none() {
        assert_eq!(to_query_params(&[]), None);
    }

    #[test]
    fn test_to_query_params_last_declaration_wins() {
        let parameters = vec![
            QueryParameter::new("param_string", ParamType::String, "My String"),
            QueryParameter::new("param_bool", ParamType::Boolean, "true"),
            QueryParameter::new("param_num", ParamType::Number, "1.23"),
            QueryParameter::new("param_string", ParamType::String, "override"),
        ];
        let params = to_query_params(&parameters).unwrap();

        assert_eq!(params.len(), 3);
        assert_eq!(
            params.get("param_string"),
            Some(&ParamValue::String("override".to_string()))
        );
        assert_eq!(params.get("param_bool"), Some(&ParamValue::Boolean(true)));
        assert_eq!(params.get("param_num"), Some(&ParamValue::Number(1.23)));
        assert_eq!(params.get("somethingelse"), None);
    }

    #[test]
    fn test_parameter_display() {
        let p = QueryParameter::new("limit", ParamType::Number, "10");
        assert_eq!(p.to_string(), "limit:number = 10");
        assert!(p.is_valid());
    }
}
