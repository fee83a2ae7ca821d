//! Parsed metadata values.
//!
//! [`MetaValue`] mirrors the YAML data model with one addition: mappings whose
//! keys are all year specs become [`MetaValue::Versioned`] at load time, so
//! resolution never re-parses keys.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::year_range::{YearBounds, YearSpec};

/// Key of a metadata mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaKey {
    Int(i64),
    Text(String),
}

impl MetaKey {
    fn from_yaml(key: &Value, origin: &str) -> Result<Self> {
        match key {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int).ok_or_else(|| unsupported(key, origin)),
            Value::Bool(b) => Ok(Self::Text(b.to_string())),
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value, origin),
            _ => Err(unsupported(key, origin)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Whether this key is addressed by a dotted-path segment.
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Text(s) => s == segment,
            Self::Int(v) => segment.trim().parse::<i64>().is_ok_and(|s| s == *v),
        }
    }

    fn to_yaml(&self) -> Value {
        match self {
            Self::Int(v) => Value::from(*v),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for MetaKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

fn unsupported(key: &Value, origin: &str) -> MetadataError {
    MetadataError::UnsupportedKey {
        origin: origin.to_string(),
        key: format!("{key:?}"),
    }
}

pub type MetaMap = BTreeMap<MetaKey, MetaValue>;

/// Keys whose mappings are keyed by survey codes.
const CODE_MAP_KEYS: [&str; 2] = ["categories", "replace"];

/// A node of a metadata document.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<MetaValue>),
    Map(MetaMap),
    /// Year-keyed branches in document order.
    Versioned(Vec<(YearSpec, MetaValue)>),
}

impl MetaValue {
    /// Convert a YAML node, detecting year-keyed mappings.
    pub fn from_yaml(value: &Value, bounds: YearBounds, origin: &str) -> Result<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Self::Int(v),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Sequence(items) => Self::List(
                items
                    .iter()
                    .map(|item| Self::from_yaml(item, bounds, origin))
                    .collect::<Result<_>>()?,
            ),
            Value::Mapping(mapping) => Self::from_mapping(mapping, bounds, origin)?,
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value, bounds, origin)?,
        })
    }

    fn from_mapping(mapping: &Mapping, bounds: YearBounds, origin: &str) -> Result<Self> {
        if let Some(specs) = year_keys(mapping, bounds, origin)? {
            let branches = specs
                .into_iter()
                .zip(mapping.values())
                .map(|(spec, value)| Ok((spec, Self::from_yaml(value, bounds, origin)?)))
                .collect::<Result<_>>()?;
            return Ok(Self::Versioned(branches));
        }
        Ok(Self::Map(map_from_yaml(mapping, bounds, origin)?))
    }

    /// Convert a mapping keyed by survey codes.
    ///
    /// Year keys version such a mapping only when every branch is itself a
    /// mapping; otherwise keys inside the year bounds are codes.
    fn code_map_from_yaml(value: &Value, bounds: YearBounds, origin: &str) -> Result<Self> {
        let Value::Mapping(mapping) = value else {
            return Self::from_yaml(value, bounds, origin);
        };
        match year_keys(mapping, bounds, origin)? {
            Some(specs) if mapping.values().all(Value::is_mapping) => {
                let branches = specs
                    .into_iter()
                    .zip(mapping.values())
                    .map(|(spec, value)| Ok((spec, Self::code_map_from_yaml(value, bounds, origin)?)))
                    .collect::<Result<_>>()?;
                Ok(Self::Versioned(branches))
            }
            Some(_) => {
                debug!(origin, keys = mapping.len(), "Reading year-like keys as codes");
                Ok(Self::Map(map_from_yaml(mapping, bounds, origin)?))
            }
            None => Ok(Self::Map(map_from_yaml(mapping, bounds, origin)?)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::List(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Versioned(_) => "year-keyed mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_) | Self::Versioned(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MetaMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Child addressed by one path segment.
    ///
    /// Mapping keys match by text or integer value; year-keyed branches match
    /// by their key as written (`1390`, `1383-1389`, `default`).
    pub fn get(&self, segment: &str) -> Option<&MetaValue> {
        match self {
            Self::Map(map) => lookup(map, segment),
            Self::Versioned(branches) => branches
                .iter()
                .find(|(spec, _)| spec.to_string() == segment.trim())
                .map(|(_, value)| value),
            Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Textual form of a scalar, as it would appear in a document.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Null => Some("null".to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => Value::from(*v),
            Self::Text(s) => Value::from(s.as_str()),
            Self::List(items) => Value::Sequence(items.iter().map(Self::to_yaml).collect()),
            Self::Map(map) => Value::Mapping(map_to_yaml(map)),
            Self::Versioned(branches) => Value::Mapping(
                branches
                    .iter()
                    .map(|(spec, value)| (Value::from(spec.to_string()), value.to_yaml()))
                    .collect(),
            ),
        }
    }
}

/// Walk `map` along `path` segments.
pub fn lookup_path<'a>(map: &'a MetaMap, path: &[&str]) -> Option<&'a MetaValue> {
    let (first, rest) = path.split_first()?;
    let mut node = lookup(map, first)?;
    for segment in rest {
        node = node.get(segment)?;
    }
    Some(node)
}

fn lookup<'a>(map: &'a MetaMap, segment: &str) -> Option<&'a MetaValue> {
    if let Some(value) = map.get(&MetaKey::Text(segment.to_string())) {
        return Some(value);
    }
    map.iter()
        .find(|(key, _)| key.matches(segment))
        .map(|(_, value)| value)
}

pub(crate) fn map_from_yaml(mapping: &Mapping, bounds: YearBounds, origin: &str) -> Result<MetaMap> {
    let mut map = MetaMap::new();
    for (key, value) in mapping {
        let key = MetaKey::from_yaml(key, origin)?;
        let value = if key.as_text().is_some_and(|k| CODE_MAP_KEYS.contains(&k)) {
            MetaValue::code_map_from_yaml(value, bounds, origin)?
        } else {
            MetaValue::from_yaml(value, bounds, origin)?
        };
        map.insert(key, value);
    }
    Ok(map)
}

pub fn map_to_yaml(map: &MetaMap) -> Mapping {
    map.iter()
        .map(|(key, value)| (key.to_yaml(), value.to_yaml()))
        .collect()
}

/// Year specs for every key, if the mapping is year-keyed.
fn year_keys(mapping: &Mapping, bounds: YearBounds, origin: &str) -> Result<Option<Vec<YearSpec>>> {
    if mapping.is_empty() {
        return Ok(None);
    }
    let mut specs = Vec::with_capacity(mapping.len());
    for key in mapping.keys() {
        match YearSpec::from_key(key, bounds, origin)? {
            Some(spec) => specs.push(spec),
            None => return Ok(None),
        }
    }
    if specs.iter().all(|spec| spec.is_fallback()) {
        return Ok(None);
    }
    Ok(Some(specs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> MetaValue {
        let value: Value = serde_yaml::from_str(text).unwrap();
        MetaValue::from_yaml(&value, YearBounds::default(), "test").unwrap()
    }

    #[test]
    fn year_keyed_mapping_becomes_versioned() {
        let value = parse("1380-1390: A\n1391: B\ndefault: C\n");
        let MetaValue::Versioned(branches) = value else {
            panic!("expected versioned node");
        };
        assert_eq!(branches.len(), 3);
        assert_eq!(branches[0], (YearSpec::Range(1380, 1390), MetaValue::from_text("A")));
        assert_eq!(branches[2].0, YearSpec::Fallback);
    }

    #[test]
    fn code_keyed_mapping_stays_a_map() {
        let value = parse("1: Urban\n2: Rural\n");
        let map = value.as_map().unwrap();
        assert_eq!(map.get(&MetaKey::Int(1)), Some(&MetaValue::from_text("Urban")));
    }

    #[test]
    fn mixed_keys_are_not_versioned() {
        let value = parse("1390: A\nname: B\n");
        assert!(value.as_map().is_some());
    }

    #[test]
    fn lone_default_key_is_a_plain_map() {
        let value = parse("default: A\n");
        assert!(value.as_map().is_some());
    }

    #[test]
    fn year_like_category_codes_stay_codes() {
        let value = parse("categories:\n  1301: Tehran\n  1302: Shemiranat\n");
        let categories = value.get("categories").unwrap().as_map().unwrap();
        assert_eq!(
            categories.get(&MetaKey::Int(1301)),
            Some(&MetaValue::from_text("Tehran"))
        );

        let value = parse("replace:\n  1400: ~\n");
        assert!(value.get("replace").unwrap().as_map().is_some());
    }

    #[test]
    fn category_maps_can_still_vary_by_year() {
        let value = parse(
            "categories:\n  1383-1389:\n    1401: Old\n  default:\n    1: New\n",
        );
        let MetaValue::Versioned(branches) = value.get("categories").unwrap() else {
            panic!("expected versioned categories");
        };
        assert_eq!(branches[0].0, YearSpec::Range(1383, 1389));
        let old = branches[0].1.as_map().unwrap();
        assert_eq!(old.get(&MetaKey::Int(1401)), Some(&MetaValue::from_text("Old")));
    }

    #[test]
    fn path_lookup_crosses_versioned_nodes() {
        let value = parse("household:\n  file_code:\n    1383-1389: R_P1\n    1390: P1\n");
        let map = value.as_map().unwrap();
        assert_eq!(
            lookup_path(map, &["household", "file_code", "1390"]),
            Some(&MetaValue::from_text("P1"))
        );
        assert_eq!(
            lookup_path(map, &["household", "file_code", "1383-1389"]),
            Some(&MetaValue::from_text("R_P1"))
        );
        assert_eq!(lookup_path(map, &["household", "missing"]), None);
    }

    #[test]
    fn yaml_round_trip_keeps_year_keys() {
        let value = parse("1380-1390: A\ndefault: ~\n");
        let yaml = value.to_yaml();
        assert_eq!(
            MetaValue::from_yaml(&yaml, YearBounds::default(), "test").unwrap(),
            value
        );
    }

    impl MetaValue {
        fn from_text(text: &str) -> Self {
            Self::Text(text.to_string())
        }
    }
}
