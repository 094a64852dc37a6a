use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::model::ForestParams;

pub const DEFAULT_CONFIG_FILE: &str = "obesity-check.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model bundle read by the single-page form and written by `train`.
    pub model_path: PathBuf,
    /// Raw obesity-levels CSV used for training.
    pub dataset_path: PathBuf,
    /// Directory for models cached by dataset hash.
    pub models_dir: PathBuf,
    pub results_dir: PathBuf,
    pub save_results: bool,
    pub forest: ForestParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/obesity_model.json"),
            dataset_path: PathBuf::from("ObesityDataSet_raw_and_data_sinthetic.csv"),
            models_dir: PathBuf::from("models"),
            results_dir: PathBuf::from("obesity_results"),
            save_results: true,
            forest: ForestParams::default(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path` when given, otherwise `obesity-check.toml` in the working
    /// directory if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.exists() => return Err(AppError::MissingAsset(p.to_path_buf())),
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
