//! Per-table column metadata.
//!
//! A table entry of the `tables` document, once resolved for a year, looks
//! like
//!
//! ```yaml
//! household:
//!   file_code: P1
//!   settings:
//!     missings: drop
//!   columns:
//!     ADDRESS:
//!       new_name: ID
//!       type: unsigned
//!     DYCOL03: drop
//!     DYCOL04:
//!       new_name: Urban_Rural
//!       type: category
//!       categories:
//!         1: Urban
//!         2: Rural
//! ```
//!
//! Column entries are parsed eagerly, so a malformed entry fails the whole
//! table even when the raw column is absent from that year's extract.

use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::error::{MetadataError, Result};
use crate::value::{MetaKey, MetaMap, MetaValue};

/// Key holding the inherited settings block in the `tables` document.
pub const DEFAULT_TABLE_SETTINGS_KEY: &str = "default_table_settings";

/// What happens to a raw column the metadata does not list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    Drop,
    #[default]
    Error,
}

impl MissingPolicy {
    fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "drop" => Some(Self::Drop),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drop => "drop",
            Self::Error => "error",
        })
    }
}

/// Table-level cleaning switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSettings {
    pub missings: MissingPolicy,
    /// Apply text sanitation to string columns.
    pub sanitize: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            missings: MissingPolicy::Error,
            sanitize: true,
        }
    }
}

impl TableSettings {
    /// Overlay the fields present in `block` on top of `self`.
    pub fn inherit(self, block: Option<&MetaValue>, table: &str) -> Result<Self> {
        let Some(block) = block.filter(|b| !b.is_null()) else {
            return Ok(self);
        };
        let invalid = |reason: String| MetadataError::InvalidTable {
            table: table.to_string(),
            reason,
        };
        let map = block
            .as_map()
            .ok_or_else(|| invalid(format!("settings must be a mapping, found {}", block.kind())))?;

        let mut settings = self;
        if let Some(value) = field(map, "missings") {
            settings.missings = value
                .as_str()
                .and_then(MissingPolicy::parse)
                .ok_or_else(|| invalid("missings must be 'drop' or 'error'".to_string()))?;
        }
        if let Some(value) = field(map, "sanitize") {
            settings.sanitize = value
                .as_bool()
                .ok_or_else(|| invalid("sanitize must be a boolean".to_string()))?;
        }
        Ok(settings)
    }
}

/// Width of a fixed unsigned integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsignedWidth {
    U8,
    U16,
    U32,
    U64,
}

impl UnsignedWidth {
    pub fn max(self) -> u64 {
        match self {
            Self::U8 => u64::from(u8::MAX),
            Self::U16 => u64::from(u16::MAX),
            Self::U32 => u64::from(u32::MAX),
            Self::U64 => u64::MAX,
        }
    }
}

/// Category relabeling table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMap {
    /// Integer codes, matched after casting values to `i32`.
    Codes(BTreeMap<i32, String>),
    /// Text keys, matched against the value's textual form.
    Keys(BTreeMap<String, String>),
}

impl CategoryMap {
    pub fn len(&self) -> usize {
        match self {
            Self::Codes(map) => map.len(),
            Self::Keys(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels in key order.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::Codes(map) => map.values().map(String::as_str).collect(),
            Self::Keys(map) => map.values().map(String::as_str).collect(),
        }
    }
}

/// Target type of a kept column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Boolean { true_value: i32 },
    Unsigned,
    Integer,
    Float,
    FixedUnsigned(UnsignedWidth),
    Category(CategoryMap),
}

impl DeclaredType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean { .. } => "boolean",
            Self::Unsigned => "unsigned",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::FixedUnsigned(UnsignedWidth::U8) => "UInt8",
            Self::FixedUnsigned(UnsignedWidth::U16) => "UInt16",
            Self::FixedUnsigned(UnsignedWidth::U32) => "UInt32",
            Self::FixedUnsigned(UnsignedWidth::U64) => "UInt64",
            Self::Category(_) => "category",
        }
    }

    fn parse(entry: &MetaMap, table: &str, column: &str) -> Result<Self> {
        let Some(type_value) = field(entry, "type").filter(|v| !v.is_null()) else {
            return Ok(Self::String);
        };
        let type_name = type_value.as_str().ok_or_else(|| {
            MetadataError::coercion(table, column, format!("type must be a string, found {}", type_value.kind()))
        })?;
        Ok(match type_name.trim() {
            "string" => Self::String,
            "boolean" => Self::Boolean {
                true_value: parse_true_value(entry, table, column)?,
            },
            "unsigned" => Self::Unsigned,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "UInt8" => Self::FixedUnsigned(UnsignedWidth::U8),
            "UInt16" => Self::FixedUnsigned(UnsignedWidth::U16),
            "UInt32" => Self::FixedUnsigned(UnsignedWidth::U32),
            "UInt64" => Self::FixedUnsigned(UnsignedWidth::U64),
            "category" => Self::Category(parse_categories(entry, table, column)?),
            other => {
                return Err(MetadataError::coercion(
                    table,
                    column,
                    format!("unknown type '{other}'"),
                ));
            }
        })
    }
}

fn parse_true_value(entry: &MetaMap, table: &str, column: &str) -> Result<i32> {
    let value = field(entry, "true_value")
        .or_else(|| field(entry, "true_condition"))
        .ok_or_else(|| MetadataError::coercion(table, column, "boolean column needs true_value"))?;
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| MetadataError::coercion(table, column, "true_value must be a 32-bit integer"))
}

fn parse_categories(entry: &MetaMap, table: &str, column: &str) -> Result<CategoryMap> {
    let map = field(entry, "categories")
        .and_then(MetaValue::as_map)
        .filter(|map| !map.is_empty())
        .ok_or_else(|| {
            MetadataError::coercion(table, column, "category column needs a non-empty categories mapping")
        })?;

    let label = |value: &MetaValue| -> Result<String> {
        match value {
            MetaValue::Null => Err(MetadataError::coercion(table, column, "category labels must not be null")),
            other => other.scalar_text().ok_or_else(|| {
                MetadataError::coercion(table, column, format!("category label must be a scalar, found {}", other.kind()))
            }),
        }
    };

    let integer_keyed = map.keys().next().is_some_and(|key| key.as_int().is_some());
    if integer_keyed {
        let mut codes = BTreeMap::new();
        for (key, value) in map {
            let code = key
                .as_int()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| {
                    MetadataError::coercion(table, column, format!("category key '{key}' is not a 32-bit integer code"))
                })?;
            codes.insert(code, label(value)?);
        }
        Ok(CategoryMap::Codes(codes))
    } else {
        let mut keys = BTreeMap::new();
        for (key, value) in map {
            let MetaKey::Text(key) = key else {
                return Err(MetadataError::coercion(table, column, "category keys mix codes and text"));
            };
            keys.insert(key.clone(), label(value)?);
        }
        Ok(CategoryMap::Keys(keys))
    }
}

/// Value substitutions applied before sanitation and coercion.
///
/// Keys are matched against the textual form of each raw value; a `None`
/// replacement turns the value missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplacementMap {
    entries: BTreeMap<String, Option<String>>,
}

impl ReplacementMap {
    pub fn new(entries: BTreeMap<String, Option<String>>) -> Self {
        Self { entries }
    }

    /// `None` when the value is not replaced, `Some(None)` when it becomes missing.
    pub fn get(&self, text: &str) -> Option<Option<&str>> {
        self.entries.get(text).map(Option::as_deref)
    }

    /// Replacement values, `None` for entries that make the value missing.
    pub fn replacements(&self) -> impl Iterator<Item = Option<&str>> {
        self.entries.values().map(Option::as_deref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parse(value: &MetaValue, table: &str, column: &str) -> Result<Option<Self>> {
        let map = match value {
            MetaValue::Null => return Ok(None),
            MetaValue::Map(map) => map,
            other => {
                return Err(MetadataError::schema(
                    table,
                    column,
                    format!("replace must be a mapping, found {}", other.kind()),
                ));
            }
        };
        let mut entries = BTreeMap::new();
        for (key, replacement) in map {
            let replacement = match replacement {
                MetaValue::Null => None,
                other => Some(other.scalar_text().ok_or_else(|| {
                    MetadataError::schema(
                        table,
                        column,
                        format!("replacement for '{key}' must be a scalar"),
                    )
                })?),
            };
            entries.insert(key.to_string(), replacement);
        }
        Ok(Some(Self { entries }))
    }
}

/// How to clean one kept column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub new_name: String,
    pub declared: DeclaredType,
    pub replace: Option<ReplacementMap>,
}

impl ColumnSpec {
    pub fn new(new_name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            new_name: new_name.into(),
            declared,
            replace: None,
        }
    }

    #[must_use]
    pub fn with_replace(mut self, replace: ReplacementMap) -> Self {
        self.replace = Some(replace);
        self
    }
}

/// Outcome of looking up one raw column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMetadata {
    Drop,
    Error,
    Keep(ColumnSpec),
}

impl ColumnMetadata {
    fn parse(value: &MetaValue, table: &str, column: &str) -> Result<Self> {
        match value {
            MetaValue::Text(text) if text.trim() == "drop" => Ok(Self::Drop),
            MetaValue::Text(text) if text.trim() == "error" => Ok(Self::Error),
            MetaValue::Map(entry) => {
                let new_name = field(entry, "new_name")
                    .and_then(MetaValue::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| MetadataError::schema(table, column, "missing new_name"))?;
                let declared = DeclaredType::parse(entry, table, column)?;
                let replace = match field(entry, "replace") {
                    Some(value) => ReplacementMap::parse(value, table, column)?,
                    None => None,
                };
                Ok(Self::Keep(ColumnSpec {
                    new_name: new_name.to_string(),
                    declared,
                    replace,
                }))
            }
            other => Err(MetadataError::schema(
                table,
                column,
                format!(
                    "expected 'drop', 'error' or a mapping, found {}",
                    other.scalar_text().unwrap_or_else(|| other.kind().to_string())
                ),
            )),
        }
    }
}

/// Year-resolved metadata of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    name: String,
    file_code: Option<String>,
    settings: TableSettings,
    columns: BTreeMap<String, ColumnMetadata>,
}

impl TableMetadata {
    /// Build from a table entry already resolved for one year.
    ///
    /// `defaults` is the settings block inherited from
    /// `default_table_settings`; the table's own `settings` override it field
    /// by field.
    pub fn from_resolved(name: &str, value: &MetaValue, defaults: TableSettings) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| MetadataError::InvalidTable {
            table: name.to_string(),
            reason: format!("expected a mapping, found {}", value.kind()),
        })?;

        let file_code = match field(map, "file_code") {
            None | Some(MetaValue::Null) => None,
            Some(value) => Some(file_code_text(value).ok_or_else(|| MetadataError::InvalidTable {
                table: name.to_string(),
                reason: format!("file_code must be a string, found {}", value.kind()),
            })?),
        };

        let settings = defaults.inherit(field(map, "settings"), name)?;

        let mut columns = BTreeMap::new();
        match field(map, "columns") {
            None | Some(MetaValue::Null) => {}
            Some(MetaValue::Map(entries)) => {
                for (key, entry) in entries {
                    let column = key.to_string().to_uppercase();
                    let metadata = ColumnMetadata::parse(entry, name, &column)?;
                    columns.insert(column, metadata);
                }
            }
            Some(other) => {
                return Err(MetadataError::InvalidTable {
                    table: name.to_string(),
                    reason: format!("columns must be a mapping, found {}", other.kind()),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            file_code,
            settings,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extract file identifier; `None` when the table is unavailable.
    pub fn file_code(&self) -> Option<&str> {
        self.file_code.as_deref()
    }

    pub fn settings(&self) -> TableSettings {
        self.settings
    }

    /// Listed columns, keyed by upper-cased raw name.
    pub fn columns(&self) -> &BTreeMap<String, ColumnMetadata> {
        &self.columns
    }

    /// Decision for a raw column. Matching is case-insensitive; unlisted
    /// columns follow the table's `missings` policy.
    pub fn lookup(&self, raw_column: &str) -> ColumnMetadata {
        let key = raw_column.trim().to_uppercase();
        match self.columns.get(&key) {
            Some(metadata) => metadata.clone(),
            None => {
                trace!(table = %self.name, column = raw_column, policy = %self.settings.missings, "Unlisted column");
                match self.settings.missings {
                    MissingPolicy::Drop => ColumnMetadata::Drop,
                    MissingPolicy::Error => ColumnMetadata::Error,
                }
            }
        }
    }
}

/// File identifiers may be written as numbers in YAML.
pub(crate) fn file_code_text(value: &MetaValue) -> Option<String> {
    match value {
        MetaValue::Text(s) => Some(s.trim().to_string()),
        MetaValue::Int(v) => Some(v.to_string()),
        _ => None,
    }
}

fn field<'a>(map: &'a MetaMap, key: &str) -> Option<&'a MetaValue> {
    map.get(&MetaKey::from(key))
}
