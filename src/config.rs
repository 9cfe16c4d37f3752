//! Generator configuration.
//!
//! Mirrors the options accepted by the Futen Swagger plugin. Every field is optional
//! in a config file; missing fields take the plugin's defaults.

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Futen API";
pub const DEFAULT_DESCRIPTION: &str = "Futen API Documentation";
pub const DEFAULT_VERSION: &str = "0.0.0";
pub const DEFAULT_THEME: &str = "https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css";
pub const DEFAULT_PATH: &str = "/swagger";

/// Options for document generation and for the server layer that publishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwaggerConfig {
    /// Document title (`info.title`)
    pub title: String,
    /// Document description (`info.description`)
    pub description: String,
    /// API version (`info.version`)
    pub version: String,
    /// Stylesheet URL for the viewer page served by the host server
    pub theme: String,
    /// Mount point of the viewer page; the document is served at `<path>.json`
    pub path: String,
}

impl Default for SwaggerConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            version: DEFAULT_VERSION.to_string(),
            theme: DEFAULT_THEME.to_string(),
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl SwaggerConfig {
    /// Loads a config file. `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Mount point of the generated document.
    pub fn json_path(&self) -> String {
        format!("{}.json", self.path)
    }

    /// Document URL relative to the viewer page.
    pub fn relative_json_path(&self) -> String {
        let relative = self.path.strip_prefix('/').unwrap_or(&self.path);
        format!("{}.json", relative)
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(Error::InvalidArgument(
                "the documentation path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SwaggerConfig::default();
        assert_eq!(config.title, "Futen API");
        assert_eq!(config.description, "Futen API Documentation");
        assert_eq!(config.version, "0.0.0");
        assert_eq!(config.path, "/swagger");
        assert_eq!(config.json_path(), "/swagger.json");
        assert_eq!(config.relative_json_path(), "swagger.json");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("swagger.yaml");
        fs::write(&file, "title: Pets\nversion: 2.1.0\n").unwrap();

        let config = SwaggerConfig::from_file(&file).unwrap();
        assert_eq!(config.title, "Pets");
        assert_eq!(config.version, "2.1.0");
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
        assert_eq!(config.theme, DEFAULT_THEME);
    }

    #[test]
    fn test_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("swagger.json");
        fs::write(&file, r#"{ "path": "/docs" }"#).unwrap();

        let config = SwaggerConfig::from_file(&file).unwrap();
        assert_eq!(config.json_path(), "/docs.json");
        assert_eq!(config.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let config = SwaggerConfig {
            path: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
