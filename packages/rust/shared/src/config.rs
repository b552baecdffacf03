//! Application configuration for catalog-import.
//!
//! User config lives at `~/.catalog-import/catalog-import.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogImportError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "catalog-import.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".catalog-import";

// ---------------------------------------------------------------------------
// Config structs (matching catalog-import.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Import behaviour.
    #[serde(default)]
    pub import: ImportConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL catalog database.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "var/catalog.db".into()
}

/// `[import]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maintain denormalized article/category rows after linking.
    #[serde(default = "default_true")]
    pub denormalize: bool,

    /// Abort a batch at the first record whose parent is missing.
    #[serde(default)]
    pub stop_on_error: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            denormalize: true,
            stop_on_error: false,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.catalog-import/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CatalogImportError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.catalog-import/catalog-import.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogImportError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CatalogImportError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CatalogImportError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CatalogImportError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CatalogImportError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("var/catalog.db"));
        assert!(toml_str.contains("denormalize = true"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[database]
path = "/srv/shop/catalog.db"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.database.path, "/srv/shop/catalog.db");
        assert!(config.import.denormalize);
        assert!(!config.import.stop_on_error);
    }

    #[test]
    fn import_section_overrides() {
        let toml_str = r#"
[import]
denormalize = false
stop_on_error = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.database.path, "var/catalog.db");
        assert!(!config.import.denormalize);
        assert!(config.import.stop_on_error);
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("catalog-import-does-not-exist.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, CatalogImportError::Io { .. }));
    }
}
