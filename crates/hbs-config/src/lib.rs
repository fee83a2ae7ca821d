//! Tiered settings for the household budget survey tools.
//!
//! Settings are a flat table of key-paths built from three YAML documents:
//! the compiled-in defaults, an optional package override and an optional
//! local override. See [`SettingsStore`] for the merge rules and
//! [`DataLayout`] for the typed directory view used by the cleaners.
//! [`setup_settings`] and [`setup_metadata`] bootstrap the local override
//! files of a new root directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use hbs_config::{DataLayout, SettingsStore, package_root};
//!
//! let settings = SettingsStore::load(&package_root(), &std::env::current_dir()?)?;
//! let layout = DataLayout::from_settings(&settings)?;
//! println!("cleaned tables go to {}", layout.cleaned_data.display());
//! ```

pub mod embedded;
pub mod error;
pub mod flatten;
pub mod layout;
pub mod paths;
pub mod settings;
pub mod setup;
pub mod years;

pub use embedded::{DEFAULT_SETTINGS, SETTINGS_SAMPLE};
pub use error::{ConfigError, Result};
pub use flatten::{KeyPath, flatten, parse_document};
pub use layout::DataLayout;
pub use paths::{PACKAGE_DIR_ENV_VAR, package_root};
pub use settings::{SettingsStore, SettingsTable};
pub use setup::{SetupAction, SetupOutcome, install, setup_metadata, setup_settings};
pub use years::{YearItem, YearSelection};
