//! Configuration and data directory handling.
//!
//! The data directory (default `$HOME/ledgerbook`, overridable with
//! `--home`/`LEDGERBOOK_HOME`) holds `config.json` plus a `cache/` directory
//! with the durable ledger snapshot. The config remembers which workbook, if
//! any, is attached so that separate invocations keep mirroring to it.

use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "ledgerbook";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const CACHE_DIR: &str = "cache";

/// The `Config` object represents the data directory. Instantiate it with
/// the path to the ledgerbook home; it loads (or creates) the `config.json`
/// inside and provides the paths the rest of the program needs.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    cache_dir: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Loads the data directory at `home`, creating it (and a default
    /// config file) on first use.
    pub fn load_or_create(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        utils::make_dir(&maybe_relative).context("Unable to create the ledgerbook home")?;
        let root = utils::canonicalize(&maybe_relative)?;

        let cache_dir = root.join(CACHE_DIR);
        utils::make_dir(&cache_dir)?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path)?
        } else {
            let file = ConfigFile::default();
            file.save(&config_path)?;
            file
        };

        Ok(Self {
            root,
            cache_dir,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the [`crate::FileStore`] keeps the ledger snapshot.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The workbook attached by a previous `create` or `open`, if any.
    pub fn document(&self) -> Option<&Path> {
        self.config_file.document.as_deref()
    }

    /// Remembers (or forgets) the attached workbook across invocations.
    pub fn set_document(&mut self, document: Option<PathBuf>) -> Result<()> {
        self.config_file.document = document;
        self.config_file.save(&self.config_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct ConfigFile {
    app_name: String,
    config_version: u8,
    /// Path of the attached workbook, absent when none is attached.
    #[serde(default)]
    document: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            document: None,
        }
    }
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self> {
        let content = utils::read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Unable to parse config file {}", path.display()))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Unable to serialize the config")?;
        utils::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("ledgerbook");

        let mut config = Config::load_or_create(&home).unwrap();
        assert!(config.document().is_none());
        assert!(config.cache_dir().is_dir());

        config
            .set_document(Some(PathBuf::from("/tmp/budget.xlsx")))
            .unwrap();

        let reloaded = Config::load_or_create(&home).unwrap();
        assert_eq!(
            reloaded.document(),
            Some(Path::new("/tmp/budget.xlsx"))
        );
    }
}
