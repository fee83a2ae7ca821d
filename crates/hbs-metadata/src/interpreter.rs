//! Text transforms applied to metadata files before parsing.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MetadataError, Result};
use crate::value::{MetaMap, lookup_path};

/// `{{ key.path }}` with optional inner whitespace.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("Invalid placeholder regex")
});

/// Pre-parse transform selected per document in settings
/// (`metadata_interpreters.<document>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpreter {
    /// `none`: text is parsed as written.
    #[default]
    Identity,
    /// `placeholders`: `{{ a.b.c }}` is replaced by the scalar found at that
    /// key path of the context document.
    Placeholders,
}

impl Interpreter {
    pub fn from_name(document: &str, name: &str) -> Result<Self> {
        match name.trim() {
            "none" | "" => Ok(Self::Identity),
            "placeholders" => Ok(Self::Placeholders),
            other => Err(MetadataError::UnknownInterpreter {
                document: document.to_string(),
                interpreter: other.to_string(),
            }),
        }
    }

    pub fn apply<'a>(self, text: &'a str, context: &MetaMap, document: &str) -> Result<Cow<'a, str>> {
        match self {
            Self::Identity => Ok(Cow::Borrowed(text)),
            Self::Placeholders => substitute(text, context, document),
        }
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identity => "none",
            Self::Placeholders => "placeholders",
        })
    }
}

fn substitute<'a>(text: &'a str, context: &MetaMap, document: &str) -> Result<Cow<'a, str>> {
    if !PLACEHOLDER.is_match(text) {
        return Ok(Cow::Borrowed(text));
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let unresolved = |reason| MetadataError::UnresolvedPlaceholder {
            document: document.to_string(),
            placeholder: key.as_str().to_string(),
            reason,
        };
        let path: Vec<&str> = key.as_str().split('.').collect();
        let value = lookup_path(context, &path).ok_or_else(|| unresolved("no such key"))?;
        let replacement = value
            .scalar_text()
            .ok_or_else(|| unresolved("value is not a scalar"))?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replacement);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(Cow::Owned(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MetadataDocument;
    use crate::year_range::YearBounds;

    fn context(text: &str) -> MetaMap {
        MetadataDocument::parse("ctx", text, YearBounds::default())
            .unwrap()
            .root()
            .clone()
    }

    #[test]
    fn identity_leaves_text_alone() {
        let out = Interpreter::Identity
            .apply("a: {{ b }}\n", &MetaMap::new(), "tables")
            .unwrap();
        assert_eq!(out, "a: {{ b }}\n");
    }

    #[test]
    fn placeholders_pull_scalars_from_context() {
        let ctx = context("household:\n  file_code:\n    1390: P1_90\n  rows: 12\n");
        let out = Interpreter::Placeholders
            .apply(
                "a: {{household.file_code.1390}}\nb: {{ household.rows }}\n",
                &ctx,
                "tables",
            )
            .unwrap();
        assert_eq!(out, "a: P1_90\nb: 12\n");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let err = Interpreter::Placeholders
            .apply("a: {{ nope.x }}\n", &MetaMap::new(), "tables")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unresolved placeholder '{{nope.x}}' in document 'tables': no such key"
        );
    }

    #[test]
    fn non_scalar_placeholder_is_an_error() {
        let ctx = context("household:\n  file_code: P1\n");
        let err = Interpreter::Placeholders
            .apply("a: {{ household }}\n", &ctx, "tables")
            .unwrap_err();
        assert!(matches!(
            err,
            MetadataError::UnresolvedPlaceholder { reason: "value is not a scalar", .. }
        ));
    }

    #[test]
    fn names() {
        assert_eq!(Interpreter::from_name("t", "none").unwrap(), Interpreter::Identity);
        assert_eq!(
            Interpreter::from_name("t", "placeholders").unwrap(),
            Interpreter::Placeholders
        );
        assert!(matches!(
            Interpreter::from_name("t", "jinja"),
            Err(MetadataError::UnknownInterpreter { .. })
        ));
    }
}
