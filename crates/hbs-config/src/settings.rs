//! Merged settings table.
//!
//! Precedence, lowest to highest:
//!
//! 1. compiled defaults ([`crate::embedded::DEFAULT_SETTINGS`])
//! 2. package override (`package_settings`, relative to the package directory)
//! 3. local override (`local_settings`, relative to the root directory)
//!
//! An override replaces whole leaves at key-paths that already exist in the
//! defaults. Key-paths that appear only in an override are dropped, so a typo
//! in an override never injects dead configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::embedded::DEFAULT_SETTINGS;
use crate::error::{ConfigError, Result};
use crate::flatten::{KeyPath, flatten, parse_document};

/// Flat key-path table produced by [`SettingsStore`].
#[derive(Debug, Clone)]
pub struct SettingsTable {
    values: BTreeMap<KeyPath, Value>,
    package_dir: PathBuf,
    root_dir: PathBuf,
}

impl SettingsTable {
    fn new(values: BTreeMap<KeyPath, Value>, package_dir: PathBuf, root_dir: PathBuf) -> Self {
        Self {
            values,
            package_dir,
            root_dir,
        }
    }

    /// Overwrite matching key-paths in place; returns the paths that were ignored.
    fn apply_override(&mut self, overrides: BTreeMap<KeyPath, Value>) -> Vec<KeyPath> {
        let mut ignored = Vec::new();
        for (path, value) in overrides {
            match self.values.get_mut(&path) {
                Some(slot) => *slot = value,
                None => ignored.push(path),
            }
        }
        ignored
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyPath, &Value)> {
        self.values.iter()
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        self.values.get(&KeyPath::from(path))
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    pub fn require(&self, path: &[&str]) -> Result<&Value> {
        self.get(path).ok_or_else(|| ConfigError::MissingKey {
            path: path.join("."),
        })
    }

    pub fn get_str(&self, path: &[&str]) -> Result<&str> {
        match self.require(path)? {
            Value::String(s) => Ok(s),
            other => Err(invalid(path, "a string", other)),
        }
    }

    pub fn get_i64(&self, path: &[&str]) -> Result<i64> {
        match self.require(path)? {
            Value::Number(n) if n.is_i64() => n.as_i64().ok_or_else(|| invalid_number(path, n)),
            other => Err(invalid(path, "an integer", other)),
        }
    }

    pub fn get_u32(&self, path: &[&str]) -> Result<u32> {
        let value = self.get_i64(path)?;
        u32::try_from(value).map_err(|_| ConfigError::InvalidValue {
            path: path.join("."),
            expected: "a non-negative 32-bit integer",
            found: value.to_string(),
        })
    }

    pub fn get_bool(&self, path: &[&str]) -> Result<bool> {
        match self.require(path)? {
            Value::Bool(b) => Ok(*b),
            other => Err(invalid(path, "a boolean", other)),
        }
    }

    /// A string setting interpreted as a filesystem path.
    pub fn get_path(&self, path: &[&str]) -> Result<PathBuf> {
        self.get_str(path).map(PathBuf::from)
    }

    /// Resolve a path setting against the package directory unless absolute.
    pub fn package_path(&self, path: &[&str]) -> Result<PathBuf> {
        Ok(join_relative(&self.package_dir, self.get_path(path)?))
    }

    /// Resolve a path setting against the root directory unless absolute.
    pub fn root_path(&self, path: &[&str]) -> Result<PathBuf> {
        Ok(join_relative(&self.root_dir, self.get_path(path)?))
    }
}

fn join_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn invalid(path: &[&str], expected: &'static str, found: &Value) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.join("."),
        expected,
        found: describe(found),
    }
}

fn invalid_number(path: &[&str], n: &serde_yaml::Number) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.join("."),
        expected: "an integer",
        found: n.to_string(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}

/// Loader for the tiered settings documents.
pub struct SettingsStore;

impl SettingsStore {
    /// Load compiled defaults, then the package and root overrides if present.
    pub fn load(package_dir: &Path, root_dir: &Path) -> Result<SettingsTable> {
        let defaults = flatten(
            &parse_document(DEFAULT_SETTINGS, "default settings")?,
            "default settings",
        )?;
        let mut table = SettingsTable::new(defaults, package_dir.to_path_buf(), root_dir.to_path_buf());

        let package_override = table.package_path(&["package_settings"])?;
        if let Some(text) = read_optional(&package_override)? {
            merge_override(&mut table, &text, &package_override.display().to_string())?;
        }

        let root_override = table.root_path(&["local_settings"])?;
        if let Some(text) = read_optional(&root_override)? {
            merge_override(&mut table, &text, &root_override.display().to_string())?;
        }

        debug!(
            settings = table.len(),
            package_dir = %table.package_dir.display(),
            root_dir = %table.root_dir.display(),
            "Loaded settings"
        );
        Ok(table)
    }

    /// Merge in-memory documents with the same precedence as [`SettingsStore::load`].
    pub fn from_sources(
        defaults: &str,
        package_override: Option<&str>,
        root_override: Option<&str>,
        package_dir: &Path,
        root_dir: &Path,
    ) -> Result<SettingsTable> {
        let flat = flatten(&parse_document(defaults, "defaults")?, "defaults")?;
        let mut table = SettingsTable::new(flat, package_dir.to_path_buf(), root_dir.to_path_buf());
        if let Some(text) = package_override {
            merge_override(&mut table, text, "package override")?;
        }
        if let Some(text) = root_override {
            merge_override(&mut table, text, "root override")?;
        }
        Ok(table)
    }
}

fn merge_override(table: &mut SettingsTable, text: &str, origin: &str) -> Result<()> {
    let overrides = flatten(&parse_document(text, origin)?, origin)?;
    let ignored = table.apply_override(overrides);
    for path in &ignored {
        debug!(origin, key = %path, "Ignoring setting that is not present in defaults");
    }
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::io(path, e)),
    }
}
