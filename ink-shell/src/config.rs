//! Startup configuration, resolved once from the environment.

use ink_store::StoreConfig;
use log::warn;
use std::path::PathBuf;

/// Overrides the data directory.
pub const DATA_DIR_VAR: &str = "INK_DATA_DIR";
/// Overrides the simulated toolbar width.
pub const TOOLBAR_WIDTH_VAR: &str = "INK_TOOLBAR_WIDTH";

pub const DEFAULT_TOOLBAR_WIDTH: f32 = 800.0;

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub store: StoreConfig,
    pub toolbar_width: f32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            toolbar_width: DEFAULT_TOOLBAR_WIDTH,
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(DATA_DIR_VAR).ok(),
            std::env::var(TOOLBAR_WIDTH_VAR).ok(),
        )
    }

    /// Build from raw variable values. Unusable values fall back to the
    /// defaults with a warning.
    pub fn from_vars(data_dir: Option<String>, toolbar_width: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            config.store.path = PathBuf::from(dir);
        }

        if let Some(raw) = toolbar_width {
            match raw.trim().parse::<f32>() {
                Ok(w) if w.is_finite() && w >= 0.0 => config.toolbar_width = w,
                _ => warn!(
                    "ignoring {TOOLBAR_WIDTH_VAR}={raw:?}, using {DEFAULT_TOOLBAR_WIDTH}"
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_vars() {
        let config = ShellConfig::from_vars(None, None);
        assert_eq!(config.store.path, PathBuf::from("ink_data"));
        assert_eq!(config.toolbar_width, DEFAULT_TOOLBAR_WIDTH);
    }

    #[test]
    fn test_vars_override() {
        let config = ShellConfig::from_vars(Some("/tmp/ink".into()), Some(" 420 ".into()));
        assert_eq!(config.store.path, PathBuf::from("/tmp/ink"));
        assert_eq!(config.toolbar_width, 420.0);
        assert_eq!(config.store.key_prefix, "ink_app_storage");
    }

    #[test]
    fn test_bad_width_falls_back() {
        let config = ShellConfig::from_vars(Some("  ".into()), Some("wide".into()));
        assert_eq!(config.store.path, PathBuf::from("ink_data"));
        assert_eq!(config.toolbar_width, DEFAULT_TOOLBAR_WIDTH);
    }
}
