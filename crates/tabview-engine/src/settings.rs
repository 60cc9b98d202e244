//! Engine settings file
//!
//! Settings live in `<config_dir>/tabview/settings.json`. A missing file
//! yields defaults; every struct is `#[serde(default)]` so older files with
//! fewer keys still load.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::SelectionPolicy;

const APP_DIR: &str = "tabview";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join(APP_DIR))
}

pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .context("Could not determine data directory")
        .map(|p| p.join(APP_DIR))
}

/// Default location of the SQLite preference database
pub fn preferences_db_path() -> Result<PathBuf> {
    data_dir().map(|p| p.join("preferences.db"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub table: TableDefaults,
    pub storage: StorageSettings,
}

/// Defaults applied to every table config built with
/// [`FilterConfig::with_defaults`](crate::FilterConfig::with_defaults)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDefaults {
    pub page_size_options: Vec<usize>,
    pub default_page_size: usize,
    pub selection_policy: SelectionPolicy,
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            page_size_options: vec![10, 25, 50, 100],
            default_page_size: 25,
            selection_policy: SelectionPolicy::ClearOnFilterChange,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Preference database; `None` uses [`preferences_db_path`]
    pub preferences_db: Option<PathBuf>,
}

impl StorageSettings {
    pub fn resolved_preferences_db(&self) -> Result<PathBuf> {
        match &self.preferences_db {
            Some(path) => Ok(path.clone()),
            None => preferences_db_path(),
        }
    }
}

impl EngineSettings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        config_dir().map(|p| p.join("settings.json"))
    }
}
