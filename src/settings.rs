//! Physics configuration
//!
//! Process-wide knobs settable before a step: gravity, world bounds,
//! quad-tree tuning and the overlap bias. Persisted as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Rect;

/// Errors from loading or saving a [`PhysicsConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("Config I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid config JSON
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parsed, but a value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// World-level physics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Added to every gravity-enabled body's velocity each step
    pub gravity: Vec2,
    /// Region the spatial index covers and bodies may be clamped to
    pub bounds: Rect,
    /// Fixed step duration in seconds
    pub step_duration: f32,
    /// Quad-tree node capacity
    pub max_objects: usize,
    /// Quad-tree depth limit
    pub max_levels: u32,
    /// Per-step overlap tolerance
    pub overlap_bias: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            bounds: Rect::new(0.0, 0.0, WORLD_WIDTH, WORLD_HEIGHT),
            step_duration: SIM_DT,
            max_objects: QUAD_TREE_MAX_OBJECTS,
            max_levels: QUAD_TREE_MAX_LEVELS,
            overlap_bias: OVERLAP_BIAS,
        }
    }
}

impl PhysicsConfig {
    /// Parse and validate config JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PhysicsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_duration.is_finite() && self.step_duration > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "step_duration must be positive, got {}",
                self.step_duration
            )));
        }
        if self.max_objects == 0 {
            return Err(ConfigError::Invalid("max_objects must be at least 1".into()));
        }
        if self.bounds.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "bounds must have positive area, got {:?}",
                self.bounds
            )));
        }
        if !(self.overlap_bias >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "overlap_bias must be non-negative, got {}",
                self.overlap_bias
            )));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded physics config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using default physics config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Physics config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PhysicsConfig::default();
        assert_eq!(config.max_objects, 10);
        assert_eq!(config.max_levels, 4);
        assert_eq!(config.overlap_bias, 4.0);
        assert_eq!(config.gravity, Vec2::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = PhysicsConfig::from_json(r#"{ "gravity": [0.0, 12.5], "max_levels": 6 }"#)
            .expect("valid config");
        assert_eq!(config.gravity, Vec2::new(0.0, 12.5));
        assert_eq!(config.max_levels, 6);
        assert_eq!(config.max_objects, QUAD_TREE_MAX_OBJECTS);
        assert_eq!(config.step_duration, SIM_DT);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            PhysicsConfig::from_json(r#"{ "step_duration": 0.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PhysicsConfig::from_json(r#"{ "max_objects": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PhysicsConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("arcade_physics_missing_config.json");
        let _ = fs::remove_file(&path);

        assert!(matches!(
            PhysicsConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(PhysicsConfig::load_or_default(&path), PhysicsConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join("arcade_physics_saved_config.json");
        let config = PhysicsConfig {
            gravity: Vec2::new(0.0, 9.0),
            overlap_bias: 2.0,
            ..Default::default()
        };

        config.save(&path).expect("write config");
        let loaded = PhysicsConfig::load(&path).expect("read config");
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
