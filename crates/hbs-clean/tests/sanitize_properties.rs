//! Property tests for text sanitation.

use proptest::prelude::*;

use hbs_clean::{sanitize_column, sanitize_text};
use polars::prelude::*;

// ── Strategies ───────────────────────────────────────────────────────

/// Text drawn from the characters extracts actually contain, debris included.
fn arb_raw_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .\\-,@+*_?&\\[\\]\n\r\u{00B7}]{0,16}"
}

fn arb_raw_column() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(prop::option::of(arb_raw_text()), 0..24)
}

const STRIPPED: &[char] = &['\n', '\r', ',', '@', '+', '*', '[', ']', '_', '?', '&'];

proptest! {
    /// Surviving values always carry something besides blanks, dots and hyphens.
    #[test]
    fn kept_values_are_never_blank(raw in arb_raw_text()) {
        if let Some(clean) = sanitize_text(&raw) {
            prop_assert!(clean.chars().any(|c| !c.is_whitespace() && c != '.' && c != '-'));
        }
    }

    /// Stripped characters and middle dots never survive.
    #[test]
    fn debris_is_removed(raw in arb_raw_text()) {
        if let Some(clean) = sanitize_text(&raw) {
            prop_assert!(!clean.contains(STRIPPED));
            prop_assert!(!clean.contains('\u{00B7}'), "clean output contains U+00B7");
        }
    }

    /// Plain numbers pass through untouched.
    #[test]
    fn digit_strings_are_unchanged(digits in "[0-9]{1,10}") {
        prop_assert_eq!(sanitize_text(&digits), Some(digits.clone()));
    }

    /// Column sanitation keeps length and never turns a missing value into text.
    #[test]
    fn column_shape_is_preserved(values in arb_raw_column()) {
        let column = Series::new("RAW".into(), values.clone()).into_column();
        let clean = sanitize_column(&column).unwrap();
        prop_assert_eq!(clean.len(), values.len());

        let clean: Vec<Option<String>> = clean
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        for (raw, clean) in values.iter().zip(&clean) {
            match raw {
                None => prop_assert!(clean.is_none()),
                Some(raw) => prop_assert_eq!(clean, &sanitize_text(raw)),
            }
        }
    }
}
