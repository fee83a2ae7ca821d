//! Compiled-in default settings.
//!
//! The defaults are embedded with `include_str!()` so a binary always has a
//! complete key set to merge overrides into, wherever it runs from.

/// Default settings document. Defines every key an override may replace.
pub const DEFAULT_SETTINGS: &str = include_str!("../data/default_settings.yaml");

/// Starting point for a local settings file, written by `setup_settings`.
pub const SETTINGS_SAMPLE: &str = include_str!("../data/settings_sample.yaml");
