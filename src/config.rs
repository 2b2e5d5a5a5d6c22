//! Configuration: on-disk layout, YAML settings and the model registry.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::ModelInfo;

pub const DEFAULT_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MODEL_ID: i64 = 1;

pub struct AppPaths {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub default_db: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_root(root)
    }

    pub fn from_root(root: PathBuf) -> Self {
        let data_dir = root.join(".jobsearch");
        Self {
            config_file: data_dir.join("config.yaml"),
            default_db: data_dir.join("data/jobs.db"),
            data_dir,
            root,
        }
    }

    /// Resolve a configured path against the root unless it is absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub default_threshold: f32,
    pub log_level: Option<String>,
    pub models: Vec<ModelInfo>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            default_threshold: DEFAULT_THRESHOLD,
            log_level: None,
            models: vec![ModelInfo {
                id: DEFAULT_MODEL_ID,
                name: "htp-384".to_string(),
                dimension: 384,
            }],
        }
    }
}

impl AppConfig {
    /// Load the config file under `paths`, falling back to defaults when it is absent
    pub fn load(paths: &AppPaths) -> Result<Self> {
        if !paths.config_file.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&paths.config_file)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_threshold) {
            anyhow::bail!(
                "default_threshold must be between 0 and 1, got {}",
                self.default_threshold
            );
        }
        let mut seen = std::collections::HashSet::new();
        for model in &self.models {
            if !seen.insert(model.id) {
                anyhow::bail!("model id {} is listed twice", model.id);
            }
            if model.dimension == 0 {
                anyhow::bail!("model {} has dimension 0", model.id);
            }
        }
        Ok(())
    }

    pub fn db_path(&self, paths: &AppPaths) -> PathBuf {
        self.db_path
            .as_deref()
            .map(|p| paths.resolve(p))
            .unwrap_or_else(|| paths.default_db.clone())
    }

    pub fn registry(&self) -> ModelRegistry {
        ModelRegistry::new(self.models.clone())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Known embedding models and their dimensions, handed to the ranker explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self { models }
    }

    pub fn get(&self, model_id: i64) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.default_threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.registry().get(DEFAULT_MODEL_ID).map(|m| m.dimension), Some(384));
        assert!(config.registry().get(99).is_none());
    }

    #[test]
    fn test_parse_partial_yaml() -> Result<()> {
        let config = AppConfig::parse(
            r#"
default_threshold: 0.5
models:
  - id: 1
    name: all-mpnet-base-v2
    dimension: 768
  - id: 2
    name: htp-64
    dimension: 64
"#,
        )?;
        assert_eq!(config.default_threshold, 0.5);
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.registry().get(2).map(|m| m.name.as_str()), Some("htp-64"));
        assert!(config.db_path.is_none());
        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::parse("default_threshold: 1.5").is_err());
        assert!(AppConfig::parse("unknown_key: 1").is_err());
        assert!(AppConfig::parse(
            "models:\n  - {id: 1, name: a, dimension: 8}\n  - {id: 1, name: b, dimension: 8}"
        )
        .is_err());
    }

    #[test]
    fn test_db_path_resolution() {
        let paths = AppPaths::from_root(PathBuf::from("/srv/jobs"));
        let mut config = AppConfig::default();
        assert_eq!(config.db_path(&paths), PathBuf::from("/srv/jobs/.jobsearch/data/jobs.db"));

        config.db_path = Some(PathBuf::from("custom.db"));
        assert_eq!(config.db_path(&paths), PathBuf::from("/srv/jobs/custom.db"));

        config.db_path = Some(PathBuf::from("/tmp/abs.db"));
        assert_eq!(config.db_path(&paths), PathBuf::from("/tmp/abs.db"));
    }

    #[test]
    fn test_yaml_round_trip() -> Result<()> {
        let config = AppConfig::default();
        let yaml = config.to_yaml()?;
        assert_eq!(AppConfig::parse(&yaml)?, config);
        Ok(())
    }
}
