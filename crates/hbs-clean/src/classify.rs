//! Hierarchical code labels for cleaned tables.

use std::fmt;
use std::str::FromStr;

use hbs_common::{Number, any_to_number};
use hbs_metadata::{Classification, MetadataContext};
use polars::prelude::*;
use tracing::debug;

use crate::error::{CleanError, Result};

/// Name of the label column added for `level`.
pub fn level_column_name(classification: &Classification, level: u32) -> String {
    format!("{}_level_{level}", classification.name())
}

/// Append one label column per requested level, labelling `code_column`.
///
/// Codes that are negative, fractional, wider than the code width or whose
/// prefix has no label become missing. An existing column of the same name
/// is replaced.
pub fn add_classification(
    df: &DataFrame,
    code_column: &str,
    classification: &Classification,
    levels: &[u32],
) -> Result<DataFrame> {
    for &level in levels {
        if level == 0 || level > classification.code_width() {
            return Err(CleanError::InvalidLevel {
                name: classification.name().to_string(),
                level,
                width: classification.code_width(),
            });
        }
    }
    let column = df
        .column(code_column)
        .map_err(|_| CleanError::ColumnNotFound {
            column: code_column.to_string(),
        })?;

    let mut codes: Vec<Option<u64>> = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        codes.push(
            any_to_number(column.get(idx)?)
                .and_then(Number::as_integral)
                .and_then(|code| u64::try_from(code).ok()),
        );
    }

    let mut result = df.clone();
    for &level in levels {
        let labels: Vec<Option<&str>> = codes
            .iter()
            .map(|code| code.and_then(|code| classification.label(code, level)))
            .collect();
        let name = level_column_name(classification, level);
        debug!(
            classification = classification.name(),
            level,
            labelled = labels.iter().flatten().count(),
            "Added classification labels"
        );
        result.with_column(Series::new(name.as_str().into(), labels))?;
    }
    Ok(result)
}

/// Labels to add to a code column, written `document.name:column:levels`
/// (for example `commodities.food:Commodity_Code:2,3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub document: String,
    pub name: String,
    pub column: String,
    pub levels: Vec<u32>,
}

impl ClassificationRequest {
    /// Resolve the classification for `year` and label `df`.
    pub fn apply(&self, df: &DataFrame, context: &MetadataContext, year: u32) -> Result<DataFrame> {
        let classification = context.classification(&self.document, &self.name, year)?;
        add_classification(df, &self.column, &classification, &self.levels)
    }
}

impl FromStr for ClassificationRequest {
    type Err = CleanError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| CleanError::InvalidClassificationRequest {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = input.trim().splitn(3, ':');
        let (Some(target), Some(column), Some(levels)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected document.name:column:levels"));
        };
        let Some((document, name)) = target.split_once('.') else {
            return Err(invalid("classification must be written document.name"));
        };
        let (document, name, column) = (document.trim(), name.trim(), column.trim());
        if document.is_empty() || name.is_empty() || column.is_empty() {
            return Err(invalid("empty document, name or column"));
        }
        let levels = levels
            .split(',')
            .map(|level| level.trim().parse::<u32>().map_err(|_| invalid("levels must be numbers")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            document: document.to_string(),
            name: name.to_string(),
            column: column.to_string(),
            levels,
        })
    }
}

impl fmt::Display for ClassificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels: Vec<String> = self.levels.iter().map(u32::to_string).collect();
        write!(
            f,
            "{}.{}:{}:{}",
            self.document,
            self.name,
            self.column,
            levels.join(",")
        )
    }
}
