//! Bootstrapping of local override files.
//!
//! A fresh root directory has no local settings or metadata. These helpers
//! write a settings sample and copies of the package metadata to the paths
//! the loaders read overrides from, so they can be edited in place.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::embedded::SETTINGS_SAMPLE;
use crate::error::{ConfigError, Result};
use crate::settings::SettingsTable;

/// What happened to one target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    Created,
    Replaced,
    /// The file existed and `replace` was off.
    Kept,
}

impl fmt::Display for SetupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Replaced => "replaced",
            Self::Kept => "kept",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    pub path: PathBuf,
    pub action: SetupAction,
}

/// Write the settings sample to the local settings path.
pub fn setup_settings(settings: &SettingsTable, replace: bool) -> Result<SetupOutcome> {
    let path = settings.root_path(&["local_settings"])?;
    install(&path, SETTINGS_SAMPLE, replace)
}

/// Copy each named package metadata document to its local override path.
pub fn setup_metadata(
    settings: &SettingsTable,
    documents: &[&str],
    replace: bool,
) -> Result<Vec<SetupOutcome>> {
    let mut outcomes = Vec::with_capacity(documents.len());
    for &name in documents {
        let source = settings.package_path(&["package_metadata", name])?;
        let target = settings.root_path(&["local_metadata", name])?;
        let text = std::fs::read_to_string(&source).map_err(|e| ConfigError::io(&source, e))?;
        outcomes.push(install(&target, &text, replace)?);
    }
    Ok(outcomes)
}

/// Write `contents` to `path` unless it exists and `replace` is off.
pub fn install(path: &Path, contents: &str, replace: bool) -> Result<SetupOutcome> {
    let existed = path.exists();
    if existed && !replace {
        debug!(path = %path.display(), "Keeping existing file");
        return Ok(SetupOutcome {
            path: path.to_path_buf(),
            action: SetupAction::Kept,
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::write(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ConfigError::write(path, e))?;

    let action = if existed {
        SetupAction::Replaced
    } else {
        SetupAction::Created
    };
    info!(path = %path.display(), %action, "Wrote local file");
    Ok(SetupOutcome {
        path: path.to_path_buf(),
        action,
    })
}
