//! Package directory resolution.

use std::path::PathBuf;

/// Environment variable for overriding the package directory.
pub const PACKAGE_DIR_ENV_VAR: &str = "HBS_PACKAGE_DIR";

/// Get the package directory holding `metadata/` and `config/`.
///
/// Resolution order:
/// 1. `HBS_PACKAGE_DIR` environment variable
/// 2. the workspace root this crate was built from
pub fn package_root() -> PathBuf {
    if let Ok(root) = std::env::var(PACKAGE_DIR_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}
