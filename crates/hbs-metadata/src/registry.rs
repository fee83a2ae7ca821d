//! The loaded metadata documents and the settings they were loaded with.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use hbs_config::SettingsTable;
use tracing::{debug, info};

use crate::classification::Classification;
use crate::document::MetadataDocument;
use crate::error::{MetadataError, Result};
use crate::interpreter::Interpreter;
use crate::resolver::{resolve_field, select};
use crate::table::{DEFAULT_TABLE_SETTINGS_KEY, TableMetadata, TableSettings, file_code_text};
use crate::value::{MetaMap, MetaValue};
use crate::year_range::YearBounds;

/// Names of the documents every context loads.
pub const DOCUMENTS: [&str; 3] = ["tables", "commodities", "occupations"];

/// Document describing the raw tables.
pub const TABLES_DOCUMENT: &str = "tables";

/// Settings plus every loaded metadata document.
///
/// Reloading takes `&mut self`, so readers never observe a half-reloaded
/// document.
#[derive(Debug, Clone)]
pub struct MetadataContext {
    settings: SettingsTable,
    bounds: YearBounds,
    documents: BTreeMap<String, MetadataDocument>,
}

impl MetadataContext {
    /// A context with no documents loaded.
    pub fn empty(settings: SettingsTable) -> Result<Self> {
        let bounds = YearBounds::new(
            settings.get_u32(&["year_keys", "min"])?,
            settings.get_u32(&["year_keys", "max"])?,
        );
        Ok(Self {
            settings,
            bounds,
            documents: BTreeMap::new(),
        })
    }

    /// Load every document in [`DOCUMENTS`].
    pub fn load(settings: SettingsTable) -> Result<Self> {
        let mut context = Self::empty(settings)?;
        context.reload_all()?;
        Ok(context)
    }

    pub fn reload_all(&mut self) -> Result<()> {
        for name in DOCUMENTS {
            self.reload_one(name)?;
        }
        Ok(())
    }

    /// Re-read one document from disk, leaving the others untouched.
    ///
    /// The package file is interpreted with an empty context. The local file,
    /// when present, is interpreted with the parsed package document as
    /// context and replaces its top-level keys.
    pub fn reload_one(&mut self, name: &str) -> Result<&MetadataDocument> {
        let document = self.read_document(name)?;
        info!(
            document = name,
            digest = %&document.digest()[..12],
            sources = document.sources().len(),
            "Reloaded metadata document"
        );
        self.documents.insert(name.to_string(), document);
        self.document(name)
    }

    fn read_document(&self, name: &str) -> Result<MetadataDocument> {
        let package_path = self.settings.package_path(&["package_metadata", name])?;
        let local_path = self.settings.root_path(&["local_metadata", name])?;
        let interpreter_name = match self.settings.get(&["metadata_interpreters", name]) {
            Some(_) => self.settings.get_str(&["metadata_interpreters", name])?,
            None => "none",
        };
        let interpreter = Interpreter::from_name(name, interpreter_name)?;

        let text = read_text(&package_path)?;
        let text = interpreter.apply(&text, &MetaMap::new(), name)?;
        let mut document = MetadataDocument::parse(name, &text, self.bounds)?.with_source(&package_path);

        if local_path.is_file() {
            debug!(document = name, path = %local_path.display(), "Applying local metadata override");
            let local_text = read_text(&local_path)?;
            let local_text = interpreter.apply(&local_text, document.root(), name)?;
            let local = MetadataDocument::parse(name, &local_text, self.bounds)?.with_source(&local_path);
            document.merge_override(local);
        }
        Ok(document)
    }

    /// Install a document directly, replacing any loaded one of that name.
    pub fn insert_document(&mut self, document: MetadataDocument) {
        self.documents.insert(document.name().to_string(), document);
    }

    pub fn document(&self, name: &str) -> Result<&MetadataDocument> {
        self.documents
            .get(name)
            .ok_or_else(|| MetadataError::UnknownDocument {
                name: name.to_string(),
            })
    }

    pub fn documents(&self) -> impl Iterator<Item = &MetadataDocument> {
        self.documents.values()
    }

    pub fn settings(&self) -> &SettingsTable {
        &self.settings
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    /// Tables described by the `tables` document.
    pub fn table_names(&self) -> Result<Vec<String>> {
        Ok(self
            .document(TABLES_DOCUMENT)?
            .keys()
            .map(ToString::to_string)
            .filter(|key| key != DEFAULT_TABLE_SETTINGS_KEY)
            .collect())
    }

    fn table_entry(&self, table: &str) -> Result<&MetaValue> {
        if table == DEFAULT_TABLE_SETTINGS_KEY {
            return Err(MetadataError::UnknownTable {
                table: table.to_string(),
            });
        }
        self.document(TABLES_DOCUMENT)?
            .get(table)
            .ok_or_else(|| MetadataError::UnknownTable {
                table: table.to_string(),
            })
    }

    /// Settings every table inherits, resolved for `year`.
    pub fn default_table_settings(&self, year: u32) -> Result<TableSettings> {
        let block = self.document(TABLES_DOCUMENT)?.get(DEFAULT_TABLE_SETTINGS_KEY);
        let resolved = block
            .map(|block| resolve_field(block, year, DEFAULT_TABLE_SETTINGS_KEY))
            .transpose()?;
        TableSettings::default().inherit(resolved.as_ref(), DEFAULT_TABLE_SETTINGS_KEY)
    }

    /// Metadata of `table` as it applies to `year`.
    pub fn table_metadata(&self, table: &str, year: u32) -> Result<TableMetadata> {
        let entry = self.table_entry(table)?;
        let resolved = resolve_field(entry, year, table)?;
        let defaults = self.default_table_settings(year)?;
        TableMetadata::from_resolved(table, &resolved, defaults)
    }

    /// Extract file identifier of `table` for `year`; `None` when the table
    /// does not exist in that year's release.
    pub fn resolve_file_identifier(&self, table: &str, year: u32) -> Result<Option<String>> {
        let entry = self.table_entry(table)?;
        let field = format!("{table}.file_code");
        let code = select(entry, year, table)?
            .get("file_code")
            .ok_or_else(|| MetadataError::InvalidTable {
                table: table.to_string(),
                reason: "missing file_code".to_string(),
            })?;
        match resolve_field(code, year, &field)? {
            MetaValue::Null => Ok(None),
            value => file_code_text(&value)
                .map(Some)
                .ok_or_else(|| MetadataError::InvalidTable {
                    table: table.to_string(),
                    reason: format!("file_code must be a string, found {}", value.kind()),
                }),
        }
    }

    /// Classification `name` of `document`, resolved for `year`.
    pub fn classification(&self, document: &str, name: &str, year: u32) -> Result<Classification> {
        let entry = self
            .document(document)?
            .get(name)
            .ok_or_else(|| MetadataError::InvalidClassification {
                name: name.to_string(),
                reason: format!("not defined in document '{document}'"),
            })?;
        let resolved = resolve_field(entry, year, name)?;
        Classification::from_resolved(name, &resolved)
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| MetadataError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbs_config::{DEFAULT_SETTINGS, SettingsStore};

    const TABLES: &str = r"
default_table_settings:
  missings: error
  sanitize: true
household:
  file_code:
    1383-1389: R_P1
    1390-1401: P1
  settings:
    missings: drop
  columns:
    ADDRESS:
      new_name: ID
      type: unsigned
members:
  file_code:
    1395-1401: P2
    default: ~
  columns: {}
";

    fn context() -> MetadataContext {
        let settings = SettingsStore::from_sources(
            DEFAULT_SETTINGS,
            None,
            None,
            Path::new("/pkg"),
            Path::new("/root"),
        )
        .unwrap();
        let mut context = MetadataContext::empty(settings).unwrap();
        let document = MetadataDocument::parse("tables", TABLES, context.bounds()).unwrap();
        context.insert_document(document);
        context
    }

    #[test]
    fn bounds_come_from_settings() {
        assert_eq!(context().bounds(), YearBounds::new(1300, 1500));
    }

    #[test]
    fn lists_tables_without_defaults_block() {
        assert_eq!(context().table_names().unwrap(), vec!["household", "members"]);
    }

    #[test]
    fn resolves_file_identifiers() {
        let context = context();
        assert_eq!(
            context.resolve_file_identifier("household", 1385).unwrap(),
            Some("R_P1".to_string())
        );
        assert_eq!(
            context.resolve_file_identifier("household", 1400).unwrap(),
            Some("P1".to_string())
        );
        assert_eq!(context.resolve_file_identifier("members", 1390).unwrap(), None);
        assert!(matches!(
            context.resolve_file_identifier("household", 1402),
            Err(MetadataError::Resolution { ref field, year: 1402 }) if field == "household.file_code"
        ));
    }

    #[test]
    fn table_metadata_inherits_defaults() {
        let context = context();
        let household = context.table_metadata("household", 1390).unwrap();
        assert_eq!(household.file_code(), Some("P1"));
        assert_eq!(household.settings().missings, crate::table::MissingPolicy::Drop);
        assert!(household.settings().sanitize);

        let members = context.table_metadata("members", 1396).unwrap();
        assert_eq!(members.settings().missings, crate::table::MissingPolicy::Error);
    }

    #[test]
    fn unknown_names_are_errors() {
        let context = context();
        assert!(matches!(
            context.table_metadata("nope", 1390),
            Err(MetadataError::UnknownTable { .. })
        ));
        assert!(matches!(
            context.table_metadata(DEFAULT_TABLE_SETTINGS_KEY, 1390),
            Err(MetadataError::UnknownTable { .. })
        ));
        assert!(matches!(
            context.document("industries"),
            Err(MetadataError::UnknownDocument { .. })
        ));
    }
}
