use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;
use crate::data::model::DEFAULT_CATEGORY_THRESHOLD;

/// Environment variable pointing at a JSON config file.
pub const CONFIG_ENV: &str = "SURVEY_FILTER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_category_threshold")]
    pub category_threshold: usize,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_true")]
    pub drop_empty_columns: bool,
    #[serde(default)]
    pub sheet: Option<String>, // first worksheet when None
}

fn default_category_threshold() -> usize {
    DEFAULT_CATEGORY_THRESHOLD
}
fn default_search_limit() -> usize {
    20
}
fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            category_threshold: default_category_threshold(),
            search_limit: default_search_limit(),
            drop_empty_columns: true,
            sheet: None,
        }
    }
}

impl EngineConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            category_threshold: self.category_threshold,
            drop_empty_columns: self.drop_empty_columns,
            sheet: self.sheet.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Columns shown when none are picked explicitly.
    #[serde(default = "default_display_columns")]
    pub display_columns: usize,
}

fn default_page_size() -> usize {
    20
}
fn default_display_columns() -> usize {
    8
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            display_columns: default_display_columns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load from `path`, else from `$SURVEY_FILTER_CONFIG`; defaults when
    /// neither names an existing file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var(CONFIG_ENV) {
                Ok(env_path) => PathBuf::from(env_path),
                Err(_) => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "display": { "page_size": 50 } }"#).unwrap();
        assert_eq!(cfg.display.page_size, 50);
        assert_eq!(cfg.display.display_columns, 8);
        assert_eq!(cfg.engine, EngineConfig::default());
        assert!(cfg.engine.load_options().drop_empty_columns);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = Config::load(Some(Path::new("/nonexistent/survey-filter.json"))).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
