//! Hierarchical code classifications.
//!
//! A classification document (`commodities`, `occupations`) maps a
//! classification name to a fixed code width and a list of prefix labels:
//!
//! ```yaml
//! food:
//!   code_width: 6
//!   items:
//!     - [1, Food and beverages]
//!     - [11, Food]
//!     - ["0111", Bread and cereals]
//! ```
//!
//! A prefix of `d` digits labels every code whose leading `d` digits (after
//! left-padding to `code_width`) equal it. Items are written as pairs rather
//! than mapping keys so four-digit prefixes are never read as year keys.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MetadataError, Result};
use crate::value::{MetaKey, MetaValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    name: String,
    code_width: u32,
    labels: BTreeMap<(u32, u64), String>,
}

impl Classification {
    /// Build from an entry already resolved for one year.
    pub fn from_resolved(name: &str, value: &MetaValue) -> Result<Self> {
        let invalid = |reason: String| MetadataError::InvalidClassification {
            name: name.to_string(),
            reason,
        };
        let map = value
            .as_map()
            .ok_or_else(|| invalid(format!("expected a mapping, found {}", value.kind())))?;

        let code_width = map
            .get(&MetaKey::from("code_width"))
            .and_then(MetaValue::as_i64)
            .and_then(|w| u32::try_from(w).ok())
            .filter(|w| (1..=19).contains(w))
            .ok_or_else(|| invalid("code_width must be an integer between 1 and 19".to_string()))?;

        let items = map
            .get(&MetaKey::from("items"))
            .and_then(MetaValue::as_list)
            .ok_or_else(|| invalid("items must be a list of [code, label] pairs".to_string()))?;

        let mut labels = BTreeMap::new();
        for item in items {
            let pair = item
                .as_list()
                .filter(|pair| pair.len() == 2)
                .ok_or_else(|| invalid(format!("item must be a [code, label] pair, found {}", item.kind())))?;
            let code = pair[0]
                .scalar_text()
                .filter(|code| !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()))
                .ok_or_else(|| invalid("item codes must be digit strings".to_string()))?;
            let digits = u32::try_from(code.len()).unwrap_or(u32::MAX);
            if digits > code_width {
                return Err(invalid(format!(
                    "item code {code} is longer than code_width {code_width}"
                )));
            }
            let prefix = code
                .parse::<u64>()
                .map_err(|_| invalid(format!("item code {code} does not fit 64 bits")))?;
            let label = match &pair[1] {
                MetaValue::Null => return Err(invalid(format!("item {code} has no label"))),
                other => other
                    .scalar_text()
                    .ok_or_else(|| invalid(format!("label of item {code} must be a scalar")))?,
            };
            labels.insert((digits, prefix), label);
        }

        Ok(Self {
            name: name.to_string(),
            code_width,
            labels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code_width(&self) -> u32 {
        self.code_width
    }

    /// Digit levels that carry at least one label.
    pub fn levels(&self) -> BTreeSet<u32> {
        self.labels.keys().map(|(digits, _)| *digits).collect()
    }

    /// Label of the `digits`-long prefix of `code`.
    ///
    /// `None` when the code does not fit the width, the level is out of range
    /// or the prefix has no label.
    pub fn label(&self, code: u64, digits: u32) -> Option<&str> {
        if digits == 0 || digits > self.code_width {
            return None;
        }
        if code >= 10u64.checked_pow(self.code_width).unwrap_or(u64::MAX) {
            return None;
        }
        let prefix = code / 10u64.pow(self.code_width - digits);
        self.labels.get(&(digits, prefix)).map(String::as_str)
    }
}
