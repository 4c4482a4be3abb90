//! Layered configuration
//!
//! Layers are deep-merged as TOML tables, lowest precedence first:
//! 1. Built-in defaults (the terrain preset, vehicle and follower defaults)
//! 2. Global: `~/.ridgeway/config.toml`
//! 3. Project: `ridgeway.toml` in the working directory
//! 4. An explicit `--config` file
//! 5. Environment: `RIDGEWAY_SEED`, `RIDGEWAY_SEGMENTS`, `RIDGEWAY_PRESET`
//! 6. Command-line flags
//!
//! A config file has up to three tables:
//!
//! ```toml
//! [terrain]
//! preset = "mountains"
//! seed = "canyon-run"
//!
//! [vehicle]
//! max_speed = 40.0
//!
//! [follower]
//! height_smoothing = 0.2
//! ```

use anyhow::{Context, Result};
use ridgeway_physics::{FollowerConfig, VehicleConfig};
use ridgeway_terrain::config::merge_toml;
use ridgeway_terrain::TerrainConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG: &str = "ridgeway.toml";

/// Values from command-line flags, applied last
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<String>,
    pub segments: Option<u32>,
    pub preset: Option<String>,
    pub size: Option<f32>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct RidgewayConfig {
    pub terrain: TerrainConfig,
    pub vehicle: VehicleConfig,
    pub follower: FollowerConfig,
    /// Files that contributed, in merge order
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

impl RidgewayConfig {
    /// Resolve all layers against the real environment and filesystem
    pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut files = Vec::new();
        if let Some(global) = global_config_path() {
            if global.exists() {
                files.push(global);
            }
        }
        let project = PathBuf::from(PROJECT_CONFIG);
        if project.exists() {
            files.push(project);
        }
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file '{}' not found", path.display());
            }
            files.push(path.to_path_buf());
        }

        Self::load_layers(&files, |key| std::env::var(key).ok(), overrides)
    }

    /// Merge the given files in order, then environment and flag overrides.
    /// `env` looks up environment variables.
    pub fn load_layers(
        files: &[PathBuf],
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        for path in files {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            let layer: toml::Value = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config '{}'", path.display()))?;
            log::debug!("Merging config layer {}", path.display());
            merge_toml(&mut merged, layer);
        }

        let mut terrain_overrides = toml::map::Map::new();
        if let Some(seed) = env("RIDGEWAY_SEED") {
            terrain_overrides.insert("seed".to_string(), seed_value(&seed));
        }
        if let Some(segments) = env("RIDGEWAY_SEGMENTS") {
            let n: u32 = segments
                .trim()
                .parse()
                .with_context(|| format!("RIDGEWAY_SEGMENTS must be an integer, got '{}'", segments))?;
            terrain_overrides.insert("segments".to_string(), toml::Value::Integer(n as i64));
        }
        if let Some(preset) = env("RIDGEWAY_PRESET") {
            terrain_overrides.insert("preset".to_string(), toml::Value::String(preset));
        }

        if let Some(seed) = &overrides.seed {
            terrain_overrides.insert("seed".to_string(), seed_value(seed));
        }
        if let Some(segments) = overrides.segments {
            terrain_overrides.insert("segments".to_string(), toml::Value::Integer(segments as i64));
        }
        if let Some(preset) = &overrides.preset {
            terrain_overrides.insert("preset".to_string(), toml::Value::String(preset.clone()));
        }
        if let Some(size) = overrides.size {
            terrain_overrides.insert("size".to_string(), toml::Value::Float(size as f64));
        }

        let mut overlay = toml::map::Map::new();
        overlay.insert("terrain".to_string(), toml::Value::Table(terrain_overrides));
        merge_toml(&mut merged, toml::Value::Table(overlay));

        let section = |name: &str| {
            merged
                .get(name)
                .cloned()
                .unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()))
        };

        let terrain = TerrainConfig::from_toml_value(section("terrain")).context("Invalid [terrain] config")?;
        let vehicle: VehicleConfig = section("vehicle").try_into().context("Invalid [vehicle] config")?;
        let follower: FollowerConfig = section("follower").try_into().context("Invalid [follower] config")?;

        terrain.validate().context("Invalid [terrain] config")?;
        vehicle.validate().context("Invalid [vehicle] config")?;

        Ok(Self {
            terrain,
            vehicle,
            follower,
            sources: files.to_vec(),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// `~/.ridgeway/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".ridgeway").join("config.toml"))
}

/// Integer-looking seeds stay integers so they hash the same as in TOML
fn seed_value(seed: &str) -> toml::Value {
    match seed.trim().parse::<i64>() {
        Ok(n) => toml::Value::Integer(n),
        Err(_) => toml::Value::String(seed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeway_core::Seed;
    use ridgeway_terrain::TerrainPreset;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ridgeway_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        std::fs::remove_file(path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_layers() {
        let config = RidgewayConfig::load_layers(&[], no_env, &Overrides::default()).unwrap();
        assert_eq!(config.terrain, TerrainConfig::default());
        assert_eq!(config.vehicle, VehicleConfig::default());
        assert_eq!(config.follower, FollowerConfig::default());
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let global = temp_config(
            r#"
[terrain]
preset = "mountains"
segments = 64

[follower]
height_smoothing = 0.3
"#,
        );
        let project = temp_config(
            r#"
[terrain]
segments = 96

[terrain.noise]
height_multiplier = 40.0
"#,
        );

        let config =
            RidgewayConfig::load_layers(&[global.clone(), project.clone()], no_env, &Overrides::default())
                .unwrap();

        assert_eq!(config.terrain.preset, TerrainPreset::Mountains);
        assert_eq!(config.terrain.segments, 96);
        assert_eq!(config.terrain.noise.height_multiplier, 40.0);
        // Untouched mountain values survive
        assert_eq!(config.terrain.noise.octaves, 5);
        assert_eq!(config.follower.height_smoothing, 0.3);
        assert_eq!(config.sources.len(), 2);

        cleanup(&global);
        cleanup(&project);
    }

    #[test]
    fn env_beats_files_and_flags_beat_env() {
        let file = temp_config("[terrain]\nseed = \"from-file\"\nsegments = 40\n");
        let env = |key: &str| match key {
            "RIDGEWAY_SEED" => Some("from-env".to_string()),
            "RIDGEWAY_SEGMENTS" => Some("48".to_string()),
            _ => None,
        };

        let config = RidgewayConfig::load_layers(&[file.clone()], env, &Overrides::default()).unwrap();
        assert_eq!(config.terrain.seed, Seed::from("from-env"));
        assert_eq!(config.terrain.segments, 48);

        let flags = Overrides {
            seed: Some("7".to_string()),
            ..Overrides::default()
        };
        let config = RidgewayConfig::load_layers(&[file.clone()], env, &flags).unwrap();
        assert_eq!(config.terrain.seed, Seed::Number(7));
        assert_eq!(config.terrain.segments, 48);

        cleanup(&file);
    }

    #[test]
    fn bad_env_segments_is_an_error() {
        let env = |key: &str| (key == "RIDGEWAY_SEGMENTS").then(|| "lots".to_string());
        let err = RidgewayConfig::load_layers(&[], env, &Overrides::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("RIDGEWAY_SEGMENTS"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = temp_config("[terrain]\nsegments = 1\n");
        assert!(RidgewayConfig::load_layers(&[file.clone()], no_env, &Overrides::default()).is_err());
        cleanup(&file);
    }

    #[test]
    fn resolved_config_serializes() {
        let config = RidgewayConfig::load_layers(&[], no_env, &Overrides::default()).unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[terrain]"));
        assert!(text.contains("[follower]"));
    }
}
