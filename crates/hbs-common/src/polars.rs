//! Polars AnyValue utility functions.
//!
//! Helpers for reading survey cells regardless of the dtype the CSV reader
//! inferred: as display text, as a parsed number, or as a nullable 32-bit
//! survey code.

use polars::prelude::*;

/// A numeric cell value, keeping integers exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// Returns the value as an integer when it has no fractional part.
    pub fn as_integral(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v),
            Number::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64
                {
                    Some(v as i64)
                } else {
                    None
                }
            }
        }
    }
}

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null`, formats floats without trailing zeros.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use hbs_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::Float64(3.0)), "3");
/// assert_eq!(any_to_string(AnyValue::String("hello")), "hello");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => {
            let s = other.to_string();
            if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                s[1..s.len() - 1].to_string()
            } else {
                s
            }
        }
    }
}

/// Textual form of a cell, `None` for nulls.
///
/// Unlike [`any_to_string`] an empty string cell stays `Some("")`, so that
/// value substitution can still target it.
pub fn any_to_text(value: AnyValue<'_>) -> Option<String> {
    if any_is_null(&value) {
        None
    } else {
        Some(any_to_string(value))
    }
}

pub fn any_is_null(value: &AnyValue<'_>) -> bool {
    matches!(value, AnyValue::Null)
}

/// Formats a floating-point number as a string without trailing zeros after decimal.
///
/// # Examples
///
/// ```
/// use hbs_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(40.0), "40");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() || trimmed == "-" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// Parses survey text as a number. Integers stay exact; `NaN` and blanks are `None`.
pub fn parse_number(value: &str) -> Option<Number> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(Number::Int(v));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if !v.is_nan() => Some(Number::Float(v)),
        _ => None,
    }
}

/// Converts an `AnyValue` to a [`Number`], parsing strings.
pub fn any_to_number(value: AnyValue<'_>) -> Option<Number> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(Number::Int(i64::from(v))),
        AnyValue::Int16(v) => Some(Number::Int(i64::from(v))),
        AnyValue::Int32(v) => Some(Number::Int(i64::from(v))),
        AnyValue::Int64(v) => Some(Number::Int(v)),
        AnyValue::UInt8(v) => Some(Number::Int(i64::from(v))),
        AnyValue::UInt16(v) => Some(Number::Int(i64::from(v))),
        AnyValue::UInt32(v) => Some(Number::Int(i64::from(v))),
        AnyValue::UInt64(v) => Some(
            i64::try_from(v)
                .map(Number::Int)
                .unwrap_or(Number::Float(v as f64)),
        ),
        AnyValue::Float32(v) if !v.is_nan() => Some(Number::Float(f64::from(v))),
        AnyValue::Float64(v) if !v.is_nan() => Some(Number::Float(v)),
        AnyValue::Boolean(b) => Some(Number::Int(i64::from(b))),
        AnyValue::String(s) => parse_number(s),
        AnyValue::StringOwned(s) => parse_number(&s),
        _ => None,
    }
}

/// Interprets a cell as a nullable 32-bit survey code.
///
/// Non-integral or out-of-range values become `None`.
pub fn any_to_i32_code(value: AnyValue<'_>) -> Option<i32> {
    any_to_number(value)
        .and_then(Number::as_integral)
        .and_then(|v| i32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_floats() {
        assert_eq!(any_to_string(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(any_to_string(AnyValue::Float64(1.0)), "1");
        assert_eq!(any_to_string(AnyValue::Float64(100.0)), "100");
    }

    #[test]
    fn test_any_to_text_keeps_empty_strings() {
        assert_eq!(any_to_text(AnyValue::Null), None);
        assert_eq!(any_to_text(AnyValue::String("")), Some(String::new()));
        assert_eq!(any_to_text(AnyValue::Int64(7)), Some("7".to_string()));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("  "), None);
        assert_eq!(parse_number("42"), Some(Number::Int(42)));
        assert_eq!(parse_number(" -3 "), Some(Number::Int(-3)));
        assert_eq!(parse_number("3.0"), Some(Number::Float(3.0)));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_as_integral() {
        assert_eq!(Number::Float(3.0).as_integral(), Some(3));
        assert_eq!(Number::Float(3.5).as_integral(), None);
        assert_eq!(Number::Float(f64::INFINITY).as_integral(), None);
        assert_eq!(Number::Int(-9).as_integral(), Some(-9));
    }

    #[test]
    fn test_any_to_i32_code() {
        assert_eq!(any_to_i32_code(AnyValue::Null), None);
        assert_eq!(any_to_i32_code(AnyValue::Int64(2)), Some(2));
        assert_eq!(any_to_i32_code(AnyValue::String("2.0")), Some(2));
        assert_eq!(any_to_i32_code(AnyValue::String("2.5")), None);
        assert_eq!(any_to_i32_code(AnyValue::Int64(i64::MAX)), None);
        assert_eq!(any_to_i32_code(AnyValue::String("x")), None);
    }
}
