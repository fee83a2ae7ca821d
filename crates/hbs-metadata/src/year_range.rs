//! Year-range keys.
//!
//! A year-keyed mapping looks like
//!
//! ```yaml
//! file_code:
//!   1383-1389: R_P1
//!   1390: P1_90
//!   1391-1401: P1
//!   default: ~
//! ```
//!
//! Keys are parsed once, when the document is loaded. The grammar is closed:
//! a single year (integer or string), an inclusive `start-end` range, or the
//! `default` fallback. Only integers within [`YearBounds`] count as years, so
//! small category codes such as `1: Urban` never read as year keys.

use std::fmt;

use serde_yaml::Value;

use crate::error::{MetadataError, Result};

/// Key of the fallback branch.
pub const FALLBACK_KEY: &str = "default";

/// Inclusive bounds for integers that may be read as survey years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: u32,
    pub max: u32,
}

impl YearBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(self, year: u32) -> bool {
        (self.min..=self.max).contains(&year)
    }

    fn year(self, value: i64) -> Option<u32> {
        u32::try_from(value).ok().filter(|year| self.contains(*year))
    }

    fn year_text(self, text: &str) -> Option<u32> {
        let text = text.trim();
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        text.parse::<i64>().ok().and_then(|v| self.year(v))
    }
}

impl Default for YearBounds {
    fn default() -> Self {
        Self::new(1300, 1500)
    }
}

/// One branch selector of a year-keyed mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSpec {
    Single(u32),
    /// Inclusive on both ends.
    Range(u32, u32),
    Fallback,
}

impl YearSpec {
    /// Parse a mapping key. `Ok(None)` means the key is not a year spec.
    pub fn from_key(key: &Value, bounds: YearBounds, origin: &str) -> Result<Option<Self>> {
        match key {
            Value::Number(n) => Ok(n.as_i64().and_then(|v| bounds.year(v)).map(Self::Single)),
            Value::String(s) => Self::from_text(s, bounds, origin),
            _ => Ok(None),
        }
    }

    fn from_text(text: &str, bounds: YearBounds, origin: &str) -> Result<Option<Self>> {
        let trimmed = text.trim();
        if trimmed == FALLBACK_KEY {
            return Ok(Some(Self::Fallback));
        }
        if let Some(year) = bounds.year_text(trimmed) {
            return Ok(Some(Self::Single(year)));
        }
        let Some((start, end)) = trimmed.split_once('-') else {
            return Ok(None);
        };
        let (Some(start), Some(end)) = (bounds.year_text(start), bounds.year_text(end)) else {
            return Ok(None);
        };
        if start > end {
            return Err(MetadataError::InvalidYearRange {
                origin: origin.to_string(),
                key: text.to_string(),
                reason: "range start is after range end",
            });
        }
        Ok(Some(Self::Range(start, end)))
    }

    /// Whether this spec selects `year`. The fallback never matches directly.
    pub fn contains(self, year: u32) -> bool {
        match self {
            Self::Single(y) => y == year,
            Self::Range(start, end) => (start..=end).contains(&year),
            Self::Fallback => false,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback)
    }
}

impl fmt::Display for YearSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(year) => write!(f, "{year}"),
            Self::Range(start, end) => write!(f, "{start}-{end}"),
            Self::Fallback => f.write_str(FALLBACK_KEY),
        }
    }
}
