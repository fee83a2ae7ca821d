//! Text sanitation for raw string columns.
//!
//! Extracts carry typing debris: a middle dot used as decimal separator,
//! trailing dots, stray punctuation and hyphens used as "no answer". Steps,
//! in order:
//!
//! 1. `·` (U+00B7) becomes `.`
//! 2. trailing `.` characters are stripped
//! 3. every run of `\n \r , @ + * [ ] _ ? &` is removed
//! 4. a hyphen following a word boundary is removed
//! 5. a value made only of whitespace, `.` and `-` becomes missing

use std::sync::LazyLock;

use hbs_common::any_to_text;
use polars::prelude::*;
use regex::Regex;

use crate::error::Result;

static STRIP_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\n\r\,\@\+\*\[\]\_\?\&]+").expect("Invalid strip-characters regex")
});

static BOUNDARY_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\-").expect("Invalid boundary-hyphen regex"));

static BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\.\-]*$").expect("Invalid blank-value regex"));

const MIDDLE_DOT: char = '\u{00B7}';

/// Sanitize one value; `None` when nothing meaningful is left.
pub fn sanitize_text(value: &str) -> Option<String> {
    let value = value.replace(MIDDLE_DOT, ".");
    let value = value.trim_end_matches('.');
    let value = STRIP_CHARS.replace_all(value, "");
    let value = BOUNDARY_HYPHEN.replace_all(&value, "");
    if BLANK.is_match(&value) {
        None
    } else {
        Some(value.into_owned())
    }
}

/// Sanitize a string column; columns of any other dtype are returned as is.
pub fn sanitize_column(column: &Column) -> Result<Column> {
    if column.dtype() != &DataType::String {
        return Ok(column.clone());
    }
    let mut values: Vec<Option<String>> = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        values.push(any_to_text(column.get(idx)?).and_then(|v| sanitize_text(&v)));
    }
    Ok(Series::new(column.name().clone(), values).into_column())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_dot_is_a_decimal_separator() {
        assert_eq!(sanitize_text("3\u{00B7}5"), Some("3.5".to_string()));
    }

    #[test]
    fn trailing_dots_are_stripped() {
        assert_eq!(sanitize_text("3.0."), Some("3.0".to_string()));
        assert_eq!(sanitize_text("12..."), Some("12".to_string()));
    }

    #[test]
    fn punctuation_set_is_removed() {
        assert_eq!(sanitize_text("1,234"), Some("1234".to_string()));
        assert_eq!(sanitize_text("[a]_b?&c@d+e*f\r\n"), Some("abcdef".to_string()));
    }

    #[test]
    fn hyphen_after_word_boundary_is_removed() {
        assert_eq!(sanitize_text("12-"), Some("12".to_string()));
        assert_eq!(sanitize_text("10-20"), Some("1020".to_string()));
        assert_eq!(sanitize_text("-5"), Some("-5".to_string()));
    }

    #[test]
    fn blank_like_values_become_missing() {
        assert_eq!(sanitize_text(""), None);
        assert_eq!(sanitize_text("  "), None);
        assert_eq!(sanitize_text("-"), None);
        assert_eq!(sanitize_text(" . - "), None);
        assert_eq!(sanitize_text("..."), None);
        assert_eq!(sanitize_text("?"), None);
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(sanitize_text("Tehran"), Some("Tehran".to_string()));
        assert_eq!(sanitize_text(" 42 "), Some(" 42 ".to_string()));
    }

    #[test]
    fn only_string_columns_are_sanitized() {
        let numeric = Series::new("A".into(), [1i64, 2]).into_column();
        let same = sanitize_column(&numeric).unwrap();
        assert_eq!(same.dtype(), &DataType::Int64);
        assert_eq!(
            same.i64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );

        let text = Series::new("B".into(), [Some("3.0."), Some("-"), None]).into_column();
        let cleaned = sanitize_column(&text).unwrap();
        assert_eq!(cleaned.name().as_str(), "B");
        assert_eq!(
            cleaned.str().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some("3.0"), None, None]
        );
    }
}
