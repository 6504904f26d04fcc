//! Loading and saving gravity block tunables as JSON.
//!
//! Every section and field is optional in the file. Missing values fall back
//! to the built-in defaults, so a file can override just what it needs:
//!
//! ```json
//! { "physics": { "gravity": 0.08 }, "tool": { "throw_power": 2.5 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::physics_math::PhysicsConfig;
use crate::registry::SimulationConfig;
use crate::tool::ToolConfig;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// JSON serialization error
    Json(String),
    /// A value is outside its allowed range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// All tunables in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityBlocksConfig {
    pub physics: PhysicsConfig,
    pub simulation: SimulationConfig,
    pub tool: ToolConfig,
}

impl GravityBlocksConfig {
    /// Check every value against its allowed range.
    pub fn validate(&self) -> ConfigResult<()> {
        let p = &self.physics;
        non_negative("physics.gravity", p.gravity)?;
        unit_interval("physics.drag", p.drag)?;
        unit_interval("physics.ground_friction", p.ground_friction)?;
        unit_interval("physics.bounce_damping", p.bounce_damping)?;
        positive("physics.max_velocity", p.max_velocity)?;
        non_negative("physics.min_bounce_velocity", p.min_bounce_velocity)?;
        non_negative("physics.hold_distance", p.hold_distance)?;
        unit_interval("physics.hold_spring_strength", p.hold_spring_strength)?;
        unit_interval("physics.hold_damping", p.hold_damping)?;
        positive("physics.max_hold_velocity", p.max_hold_velocity)?;
        unit_interval("physics.history_previous_weight", p.history_previous_weight)?;
        unit_interval("physics.history_sample_weight", p.history_sample_weight)?;
        non_negative("physics.release_momentum_multiplier", p.release_momentum_multiplier)?;
        unit_interval("physics.body_restitution", p.body_restitution)?;
        non_negative("physics.body_separation", p.body_separation)?;

        positive("simulation.fixed_timestep", self.simulation.fixed_timestep)?;
        if self.simulation.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "simulation.max_steps_per_frame must be at least 1".to_string(),
            ));
        }

        let t = &self.tool;
        positive("tool.target_distance", t.target_distance)?;
        non_negative("tool.throw_power", t.throw_power)?;
        non_negative("tool.spawn_distance", t.spawn_distance)?;
        positive("tool.default_size", t.default_size)?;
        Ok(())
    }
}

fn check(name: &str, value: f32, ok: bool, expected: &str) -> ConfigResult<()> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be {}, got {}",
            name, expected, value
        )))
    }
}

fn positive(name: &str, value: f32) -> ConfigResult<()> {
    check(name, value, value > 0.0, "positive")
}

fn non_negative(name: &str, value: f32) -> ConfigResult<()> {
    check(name, value, value >= 0.0, "zero or more")
}

fn unit_interval(name: &str, value: f32) -> ConfigResult<()> {
    check(name, value, (0.0..=1.0).contains(&value), "within [0, 1]")
}

/// Load and validate a config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<GravityBlocksConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: GravityBlocksConfig =
        serde_json::from_reader(reader).map_err(|e| ConfigError::Json(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

/// Save a config as pretty-printed JSON.
pub fn save_config<P: AsRef<Path>>(config: &GravityBlocksConfig, path: P) -> ConfigResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, config)
        .map_err(|e| ConfigError::Json(e.to_string()))?;

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        GravityBlocksConfig::default().validate().unwrap();
    }

    #[test]
    fn test_save_load_json() {
        let mut config = GravityBlocksConfig::default();
        config.physics.gravity = 0.08;
        config.tool.throw_power = 2.5;
        let temp_file = NamedTempFile::with_suffix(".json").unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        temp_file
            .write_all(br#"{ "physics": { "drag": 0.9 } }"#)
            .unwrap();

        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.physics.drag, 0.9);
        assert_eq!(loaded.physics.gravity, 0.05, "unlisted field keeps default");
        assert_eq!(loaded.simulation, SimulationConfig::default());
        assert_eq!(loaded.tool, ToolConfig::default());
    }

    #[test]
    fn test_invalid_value_rejected() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        temp_file
            .write_all(br#"{ "physics": { "body_restitution": 1.5 } }"#)
            .unwrap();

        let err = load_config(temp_file.path()).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("body_restitution"));
    }

    #[test]
    fn test_zero_timestep_rejected() {
        let mut config = GravityBlocksConfig::default();
        config.simulation.fixed_timestep = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GravityBlocksConfig::default();
        config.simulation.max_steps_per_frame = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        temp_file.write_all(b"{ not json").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/gravity_blocks.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
