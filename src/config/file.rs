//! File-based configuration loading
//!
//! Loads the optional JSON file mapping custom deployment names to known models

use crate::services::catalog;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration loaded from JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Deployment name -> catalog model name
    /// e.g. `"prod-gpt4": "gpt-4"` lets a custom Azure deployment route as GPT-4
    #[serde(rename = "modelMapping", default)]
    pub model_mapping: HashMap<String, String>,
}

impl FileConfig {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: FileConfig = serde_json::from_str(&content)
            .with_context(|| "Failed to parse config JSON")?;

        config.validate()?;

        debug!("Loaded {} model mappings", config.model_mapping.len());
        Ok(config)
    }

    /// Load configuration from the default locations
    /// Searches in order:
    /// 1. ~/.config/terraform-ai/terraform-ai.json
    /// 2. ./terraform-ai.json
    ///
    /// A missing file is not an error.
    pub fn load_default() -> Result<Option<Self>> {
        match Self::default_path() {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    fn default_path() -> Option<PathBuf> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("terraform-ai").join("terraform-ai.json");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        let local_path = PathBuf::from("terraform-ai.json");
        local_path.exists().then_some(local_path)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        for (deployment, model) in &self.model_mapping {
            if deployment.trim().is_empty() {
                anyhow::bail!("Model mapping contains an empty deployment name");
            }
            if catalog::lookup(model).is_none() {
                anyhow::bail!("Deployment '{}' maps to unknown model '{}'", deployment, model);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"modelMapping": {"prod-gpt4": "gpt-4", "legacy": "text-davinci-003"}}"#)
            .unwrap();

        let config = FileConfig::load(file.path()).unwrap();

        assert_eq!(config.model_mapping.len(), 2);
        assert_eq!(config.model_mapping["prod-gpt4"], "gpt-4");
    }

    #[test]
    fn test_empty_config_is_valid() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.model_mapping.is_empty());
    }

    #[test]
    fn test_validation_unknown_target_model() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"modelMapping": {"prod": "gpt-9"}}"#).unwrap();

        assert!(FileConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        assert!(FileConfig::load(file.path()).is_err());
    }
}
