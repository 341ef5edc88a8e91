use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "folio.toml";
pub const DB_FILE: &str = "folio.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// URL prefix image paths are served under, e.g. "/manager/images".
    pub image_url_prefix: String,
    /// Rendition used when an image URL is requested without a size.
    pub default_image_size: String,
}

impl FolioConfig {
    /// Loads `folio.toml` from `data_dir`, falling back to defaults for a
    /// missing file or missing keys.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let path = data_dir.join(CONFIG_FILE);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<FolioConfig>(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.data_dir = data_dir;
        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration to `folio.toml` in the data directory.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Checks the settings that image URLs are built from.
    pub fn validate(&self) -> Result<()> {
        if self.default_image_size.trim().is_empty() {
            return Err(Error::Config(
                "default_image_size cannot be empty".to_string(),
            ));
        }
        if self.default_image_size.contains('/') {
            return Err(Error::Config(
                "default_image_size cannot contain '/'".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            image_url_prefix: "/manager/images".to_string(),
            default_image_size: "small".to_string(),
        }
    }
}
