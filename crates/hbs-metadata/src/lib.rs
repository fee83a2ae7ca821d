//! Year-versioned metadata for the household budget survey.
//!
//! Metadata documents are YAML files whose subtrees may vary by survey year:
//! any mapping keyed only by years (`1390`), inclusive ranges (`1383-1389`)
//! and an optional `default` is a year-keyed node. [`MetadataContext`] loads
//! the documents named in the settings, [`resolve`] projects a subtree onto
//! one year and [`TableMetadata`] turns a resolved table entry into
//! per-column cleaning decisions.

pub mod classification;
pub mod document;
pub mod error;
pub mod interpreter;
pub mod registry;
pub mod resolver;
pub mod table;
pub mod value;
pub mod year_range;

pub use classification::Classification;
pub use document::MetadataDocument;
pub use error::{MetadataError, Result};
pub use interpreter::Interpreter;
pub use registry::{DOCUMENTS, MetadataContext, TABLES_DOCUMENT};
pub use resolver::{resolve, resolve_field, select};
pub use table::{
    CategoryMap, ColumnMetadata, ColumnSpec, DEFAULT_TABLE_SETTINGS_KEY, DeclaredType, MissingPolicy,
    ReplacementMap, TableMetadata, TableSettings, UnsignedWidth,
};
pub use value::{MetaKey, MetaMap, MetaValue, lookup_path};
pub use year_range::{FALLBACK_KEY, YearBounds, YearSpec};
