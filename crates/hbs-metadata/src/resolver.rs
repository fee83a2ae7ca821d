//! Year projection of metadata subtrees.

use crate::error::{MetadataError, Result};
use crate::value::{MetaMap, MetaValue};
use crate::year_range::YearSpec;

/// Project `value` onto `year`.
///
/// At every year-keyed node the first branch (in document order) whose key
/// contains `year` is taken; otherwise the `default` branch; otherwise the
/// node fails to resolve. The result contains no year-keyed nodes.
pub fn resolve(value: &MetaValue, year: u32) -> Result<MetaValue> {
    resolve_field(value, year, "")
}

/// Like [`resolve`], reporting failures under the dotted `field` path.
pub fn resolve_field(value: &MetaValue, year: u32, field: &str) -> Result<MetaValue> {
    let mut path: Vec<String> = field
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    resolve_at(value, year, &mut path)
}

/// Peel the year-keyed layers at the top of `value` without descending
/// further.
pub fn select<'a>(value: &'a MetaValue, year: u32, field: &str) -> Result<&'a MetaValue> {
    let mut node = value;
    while let MetaValue::Versioned(branches) = node {
        node = branch(branches, year).ok_or_else(|| MetadataError::Resolution {
            field: field.to_string(),
            year,
        })?;
    }
    Ok(node)
}

fn branch(branches: &[(YearSpec, MetaValue)], year: u32) -> Option<&MetaValue> {
    branches
        .iter()
        .find(|(spec, _)| spec.contains(year))
        .or_else(|| branches.iter().find(|(spec, _)| spec.is_fallback()))
        .map(|(_, branch)| branch)
}

fn resolve_at(value: &MetaValue, year: u32, path: &mut Vec<String>) -> Result<MetaValue> {
    match value {
        MetaValue::Versioned(branches) => {
            let selected = branch(branches, year).ok_or_else(|| MetadataError::Resolution {
                field: path.join("."),
                year,
            })?;
            resolve_at(selected, year, path)
        }
        MetaValue::Map(map) => {
            let mut resolved = MetaMap::new();
            for (key, child) in map {
                path.push(key.to_string());
                let child = resolve_at(child, year, path);
                path.pop();
                resolved.insert(key.clone(), child?);
            }
            Ok(MetaValue::Map(resolved))
        }
        MetaValue::List(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(index.to_string());
                let item = resolve_at(item, year, path);
                path.pop();
                resolved.push(item?);
            }
            Ok(MetaValue::List(resolved))
        }
        scalar => Ok(scalar.clone()),
    }
}
