//! Key-path flattening of nested YAML documents.
//!
//! `{a: 1, b: {c: 2, d: {e: 3}}}` flattens to
//! `{(a): 1, (b, c): 2, (b, d, e): 3}`. Only mappings are descended into;
//! sequences and scalars are leaves.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value;

use crate::error::{ConfigError, Result};

/// Ordered tuple of string segments addressing one leaf value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn child(&self, segment: String) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath::new(segments.iter().copied())
    }
}

/// Parses YAML text that must have a mapping at the root.
pub fn parse_document(text: &str, origin: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
        origin: origin.to_string(),
        source,
    })?;
    match value {
        Value::Mapping(_) => Ok(value),
        // An empty override file parses as null; treat it as an empty mapping.
        Value::Null => Ok(Value::Mapping(serde_yaml::Mapping::new())),
        _ => Err(ConfigError::NotAMapping {
            origin: origin.to_string(),
        }),
    }
}

/// Flattens a nested mapping into key-path leaves.
pub fn flatten(document: &Value, origin: &str) -> Result<BTreeMap<KeyPath, Value>> {
    let mut flat = BTreeMap::new();
    match document {
        Value::Mapping(_) => flatten_into(document, &KeyPath::default(), origin, &mut flat)?,
        _ => {
            return Err(ConfigError::NotAMapping {
                origin: origin.to_string(),
            });
        }
    }
    Ok(flat)
}

fn flatten_into(
    value: &Value,
    prefix: &KeyPath,
    origin: &str,
    flat: &mut BTreeMap<KeyPath, Value>,
) -> Result<()> {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let segment = key_segment(key, origin)?;
                flatten_into(child, &prefix.child(segment), origin, flat)?;
            }
        }
        Value::Tagged(tagged) => flatten_into(&tagged.value, prefix, origin, flat)?,
        leaf => {
            flat.insert(prefix.clone(), leaf.clone());
        }
    }
    Ok(())
}

fn key_segment(key: &Value, origin: &str) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigError::InvalidKey {
            origin: origin.to_string(),
            key: format!("{other:?}"),
        }),
    }
}
