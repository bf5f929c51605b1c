use crate::animation::Easing;
use crate::bounds::DimMode;
use crate::config::config_serializer::serialize_config;
use crate::error::{DimmerError, DimmerResult};
use crate::paths;
use log::{trace, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The path the config file was loaded from
    #[serde(skip)]
    #[schemars(skip)]
    pub config_path: Option<PathBuf>,

    /// Area covered by the dim: whole_task or per_container
    pub dim_mode: DimMode,
    /// The duration of the dim fade animations in milliseconds
    pub animation_duration_ms: u32,
    /// The number of frames per second for the dim animations
    pub animation_fps: u32,
    /// Easing curve of the dim animations: linear or ease_in_out_cubic
    pub easing: Easing,
    /// Name given to the dim surface
    pub dim_layer_name: String,
    /// Z order of the dim relative to the container it is layered against
    pub relative_layer_z: i32,
    /// Whether to fade the dim out before removing it
    pub animate_exit: bool,
}

impl Config {
    pub fn default_config_path() -> Option<PathBuf> {
        paths::default_config_path()
    }

    /// Loads the config at `config_path`, or at the default path. A missing file is created
    /// with the defaults. With `save`, the file is rewritten so every field is present.
    pub fn load(config_path: Option<&Path>, save: bool) -> DimmerResult<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()
                .ok_or("Could not determine default config directory")?,
        };

        if !path.exists() {
            Self::create_default_config_file(&path)?;
            trace!("Created default config file at: {}", path.display());
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            DimmerError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        let mut config = Self::parse(&contents).map_err(|e| {
            DimmerError::Config(format!(
                "Failed to parse config file '{}': {e}",
                path.display()
            ))
        })?;
        config.config_path = Some(path.clone());

        if save {
            if let Err(e) = config.save_to_file(&path) {
                warn!("Failed to update config file with missing fields: {e}");
            }
        }

        Ok(config)
    }

    /// Parses and validates a YAML config. Missing fields take their defaults.
    pub fn parse(contents: &str) -> DimmerResult<Self> {
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DimmerResult<()> {
        if self.animation_fps == 0 {
            return Err("animation_fps must be greater than 0".into());
        }
        if self.dim_layer_name.trim().is_empty() {
            return Err("dim_layer_name must not be empty".into());
        }
        Ok(())
    }

    fn create_default_config_file(path: &Path) -> DimmerResult<()> {
        Config::default().save_to_file(path)
    }

    /// Writes the config as documented YAML.
    pub fn save_to_file(&self, path: &Path) -> DimmerResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        serialize_config(self, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            dim_mode: DimMode::WholeTask,
            animation_duration_ms: 200,
            animation_fps: 60,
            easing: Easing::EaseInOutCubic,
            dim_layer_name: "Dim Layer".to_string(),
            relative_layer_z: -1,
            animate_exit: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("animation_fps: 120\ndim_mode: per_container\n").unwrap();
        assert_eq!(config.animation_fps, 120);
        assert_eq!(config.dim_mode, DimMode::PerContainer);
        assert_eq!(config.animation_duration_ms, 200);
        assert!(config.animate_exit);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_zero_fps() {
        let err = Config::parse("animation_fps: 0").unwrap_err();
        assert!(matches!(err, DimmerError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let err = Config::parse("dim_mode: sideways").unwrap_err();
        assert!(matches!(err, DimmerError::Yaml(_)));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config::load(Some(path.as_path()), false).unwrap();

        assert!(path.exists());
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.animation_fps, Config::default().animation_fps);
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "animation_duration_ms: 350\n").unwrap();

        let config = Config::load(Some(path.as_path()), true).unwrap();
        assert_eq!(config.animation_duration_ms, 350);

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("animation_duration_ms: 350"));
        assert!(saved.contains("relative_layer_z: -1"));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "animation_fps: [1, 2]\n").unwrap();

        let err = Config::load(Some(path.as_path()), false).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
