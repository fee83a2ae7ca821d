//! Named metadata documents.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use sha2::{Digest, Sha256};

use crate::error::{MetadataError, Result};
use crate::value::{MetaKey, MetaMap, MetaValue, lookup_path, map_from_yaml};
use crate::year_range::YearBounds;

/// One loaded metadata document: a package file, optionally overridden by a
/// local file of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    name: String,
    root: MetaMap,
    sources: Vec<PathBuf>,
    digest: String,
}

impl MetadataDocument {
    /// Parse a document from (already interpreted) YAML text.
    pub fn parse(name: &str, text: &str, bounds: YearBounds) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|source| MetadataError::Yaml {
            origin: name.to_string(),
            source,
        })?;
        let root = match value {
            Value::Null => MetaMap::new(),
            Value::Mapping(mapping) => map_from_yaml(&mapping, bounds, name)?,
            _ => {
                return Err(MetadataError::NotAMapping {
                    origin: name.to_string(),
                });
            }
        };
        Ok(Self {
            name: name.to_string(),
            root,
            sources: Vec::new(),
            digest: sha256_hex(text.as_bytes()),
        })
    }

    /// Record the file the document was read from.
    pub fn with_source(mut self, path: impl AsRef<Path>) -> Self {
        self.sources.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace top-level entries with those of `overlay`.
    ///
    /// Nested content is not merged: an overridden top-level key takes the
    /// overlay's subtree whole.
    pub fn merge_override(&mut self, overlay: MetadataDocument) {
        self.digest = sha256_hex(format!("{}{}", self.digest, overlay.digest).as_bytes());
        self.sources.extend(overlay.sources);
        self.root.extend(overlay.root);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &MetaMap {
        &self.root
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Hex SHA-256 of the text(s) the document was built from.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        lookup_path(&self.root, &[key])
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&MetaValue> {
        lookup_path(&self.root, path)
    }

    /// Top-level keys, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &MetaKey> {
        self.root.keys()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> MetadataDocument {
        MetadataDocument::parse("tables", text, YearBounds::default()).unwrap()
    }

    #[test]
    fn empty_text_is_an_empty_document() {
        assert!(doc("").root().is_empty());
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let err = MetadataDocument::parse("tables", "- a\n- b\n", YearBounds::default()).unwrap_err();
        assert!(matches!(err, MetadataError::NotAMapping { .. }));
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let err = MetadataDocument::parse("tables", "a: [1\n", YearBounds::default()).unwrap_err();
        assert!(matches!(err, MetadataError::Yaml { .. }));
    }

    #[test]
    fn override_replaces_top_level_keys_whole() {
        let mut base = doc("household:\n  file_code: P1\n  name: H\nmembers:\n  file_code: P2\n");
        base.merge_override(doc("household:\n  file_code: LOCAL\n"));

        assert_eq!(
            base.get_path(&["household", "file_code"]),
            Some(&MetaValue::Text("LOCAL".to_string()))
        );
        assert_eq!(base.get_path(&["household", "name"]), None);
        assert!(base.get("members").is_some());
    }

    #[test]
    fn digest_tracks_content() {
        let a = doc("a: 1\n");
        let b = doc("a: 2\n");
        assert_eq!(a.digest().len(), 64);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), doc("a: 1\n").digest());

        let mut merged = a.clone();
        merged.merge_override(b);
        assert_ne!(merged.digest(), a.digest());
    }
}
