//! Terrain generation configuration
//!
//! Every knob has a documented default. Two presets ship with the crate,
//! `rolling_hills` and `mountains`; both drive the same pipeline with
//! different numbers. A TOML table may name a preset and override any
//! subset of its fields:
//!
//! ```toml
//! preset = "mountains"
//! seed = "canyon-run"
//! segments = 160
//!
//! [noise]
//! height_multiplier = 32.0
//! ```

use ridgeway_core::{spline, Result, RidgewayError, Seed};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named starting points for [`TerrainConfig`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainPreset {
    /// Gentle hills, light smoothing, no slope limit
    #[default]
    RollingHills,
    /// Taller, sharper relief with slope limiting
    Mountains,
}

impl TerrainPreset {
    pub fn name(&self) -> &'static str {
        match self {
            TerrainPreset::RollingHills => "rolling_hills",
            TerrainPreset::Mountains => "mountains",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rolling_hills" | "hills" => Some(TerrainPreset::RollingHills),
            "mountains" | "mountain" => Some(TerrainPreset::Mountains),
            _ => None,
        }
    }
}

/// Fractional Brownian motion parameters and the height remap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// World units → noise space
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    /// Noise in [-1, 1] is multiplied by this
    pub height_multiplier: f32,
    /// Added after the multiplier
    pub base_height: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 0.02,
            octaves: 3,
            persistence: 0.6,
            lacunarity: 2.0,
            height_multiplier: 6.0,
            base_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalloffCurve {
    #[default]
    Quadratic,
    Cubic,
}

/// Scale heights toward zero near the terrain border
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeFalloffConfig {
    pub enabled: bool,
    /// Normalized Chebyshev distance from center where falloff begins, [0, 1)
    pub start: f32,
    pub curve: FalloffCurve,
}

impl Default for EdgeFalloffConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: 0.7,
            curve: FalloffCurve::Quadratic,
        }
    }
}

/// Clamp neighbouring height differences to a maximum slope angle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeLimitConfig {
    pub enabled: bool,
    pub max_slope_degrees: f32,
    /// Minimum number of passes; more run until no cell changes
    pub passes: u32,
}

impl Default for SlopeLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_slope_degrees: 35.0,
            passes: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadBlendMode {
    /// Pull terrain toward the road elevation minus `shoulder_offset`
    #[default]
    Flatten,
    /// Pull terrain toward its own 3×3 neighbourhood mean
    Smooth,
}

/// Road route and how it is carved into the heightmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub enabled: bool,
    /// Ordered `[x, y, z]` route points
    pub control_points: Vec<[f32; 3]>,
    /// Number of sample intervals along the road
    pub sample_density: usize,
    pub mode: RoadBlendMode,
    /// Planar distance beyond which the road has no effect
    pub influence_radius: f32,
    /// Exponent of the influence falloff `1 - (d/r)^strength`
    pub strength: f32,
    /// Terrain sits this far below the road surface in flatten mode
    pub shoulder_offset: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            control_points: vec![
                [-80.0, 1.0, -60.0],
                [-40.0, 2.0, -20.0],
                [0.0, 1.5, 10.0],
                [40.0, 2.5, -10.0],
                [80.0, 1.0, 50.0],
            ],
            sample_density: spline::DEFAULT_SAMPLE_DENSITY,
            mode: RoadBlendMode::Flatten,
            influence_radius: 12.0,
            strength: 2.0,
            shoulder_offset: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Blend between height bands over normalized elevation
    #[default]
    HeightBands,
    /// One base color, lightly shaded by elevation
    SingleTone,
}

/// One elevation band; applies up to `max` normalized height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub max: f32,
    /// `0xRRGGBB`
    pub color: u32,
}

/// Vertex color derivation. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub mode: ColorMode,
    pub base_color: u32,
    pub bands: Vec<ColorBand>,
    pub road_color: u32,
    pub shoulder_color: u32,
    /// Full road width; cells within half of this are painted `road_color`
    pub road_width: f32,
    /// Width of the shoulder blend outside the road edge
    pub shoulder_width: f32,
    pub slope_blend: bool,
    pub rock_color: u32,
    pub slope_start_degrees: f32,
    pub slope_full_degrees: f32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            mode: ColorMode::HeightBands,
            base_color: 0x5A8F3C,
            bands: vec![
                ColorBand { max: 0.15, color: 0xC2B280 },
                ColorBand { max: 0.45, color: 0x4A7C3A },
                ColorBand { max: 0.75, color: 0x3B5E2B },
                ColorBand { max: 0.9, color: 0x7A7A7A },
                ColorBand { max: 1.0, color: 0xF2F2F2 },
            ],
            road_color: 0x3C3C3C,
            shoulder_color: 0x8B7D6B,
            road_width: 8.0,
            shoulder_width: 2.0,
            slope_blend: true,
            rock_color: 0x6E6A64,
            slope_start_degrees: 25.0,
            slope_full_degrees: 45.0,
        }
    }
}

/// Complete description of one terrain instance.
///
/// Identical configs (seed included) generate bit-identical heightmaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub preset: TerrainPreset,
    pub seed: Seed,
    /// Side length of the square terrain, centered at the origin
    pub size: f32,
    /// Grid cells per side; the grid holds `(segments + 1)²` samples
    pub segments: u32,
    pub smoothing_passes: u32,
    pub noise: NoiseConfig,
    pub edge_falloff: EdgeFalloffConfig,
    pub slope_limit: SlopeLimitConfig,
    pub road: RoadConfig,
    pub colors: ColorConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self::preset(TerrainPreset::RollingHills)
    }
}

impl TerrainConfig {
    pub fn preset(preset: TerrainPreset) -> Self {
        match preset {
            TerrainPreset::RollingHills => Self {
                preset,
                seed: Seed::default(),
                size: 200.0,
                segments: 128,
                noise: NoiseConfig::default(),
                smoothing_passes: 2,
                edge_falloff: EdgeFalloffConfig::default(),
                slope_limit: SlopeLimitConfig::default(),
                road: RoadConfig::default(),
                colors: ColorConfig::default(),
            },
            TerrainPreset::Mountains => Self {
                preset,
                seed: Seed::default(),
                size: 200.0,
                segments: 128,
                noise: NoiseConfig {
                    scale: 0.012,
                    octaves: 5,
                    persistence: 0.5,
                    lacunarity: 2.0,
                    height_multiplier: 25.0,
                    base_height: 2.0,
                },
                smoothing_passes: 3,
                edge_falloff: EdgeFalloffConfig {
                    enabled: true,
                    start: 0.6,
                    curve: FalloffCurve::Cubic,
                },
                slope_limit: SlopeLimitConfig {
                    enabled: true,
                    max_slope_degrees: 38.0,
                    passes: 2,
                },
                road: RoadConfig {
                    mode: RoadBlendMode::Smooth,
                    influence_radius: 16.0,
                    strength: 1.5,
                    ..RoadConfig::default()
                },
                colors: ColorConfig::default(),
            },
        }
    }

    /// World-space distance between adjacent grid samples
    pub fn cell_size(&self) -> f32 {
        self.size / self.segments as f32
    }

    /// Fail fast on anything that would silently produce broken terrain.
    pub fn validate(&self) -> Result<()> {
        RidgewayError::check_range("size", self.size as f64, 1e-3, 1e6)?;
        if self.segments < 2 {
            return Err(RidgewayError::InvalidConfig(format!(
                "segments must be at least 2, got {}",
                self.segments
            )));
        }
        RidgewayError::check_range("segments", self.segments as f64, 2.0, 4096.0)?;

        let n = &self.noise;
        RidgewayError::check_range("noise.scale", n.scale as f64, 1e-9, 1e3)?;
        RidgewayError::check_range("noise.octaves", n.octaves as f64, 1.0, 16.0)?;
        RidgewayError::check_range("noise.persistence", n.persistence as f64, 1e-6, 4.0)?;
        RidgewayError::check_range("noise.lacunarity", n.lacunarity as f64, 1.0, 8.0)?;
        RidgewayError::check_range(
            "noise.height_multiplier",
            n.height_multiplier as f64,
            0.0,
            1e5,
        )?;
        RidgewayError::check_range("noise.base_height", n.base_height as f64, -1e5, 1e5)?;

        RidgewayError::check_range("smoothing_passes", self.smoothing_passes as f64, 0.0, 64.0)?;

        if self.edge_falloff.enabled {
            RidgewayError::check_range(
                "edge_falloff.start",
                self.edge_falloff.start as f64,
                0.0,
                0.999,
            )?;
        }

        if self.slope_limit.enabled {
            RidgewayError::check_range(
                "slope_limit.max_slope_degrees",
                self.slope_limit.max_slope_degrees as f64,
                0.01,
                89.9,
            )?;
            RidgewayError::check_range("slope_limit.passes", self.slope_limit.passes as f64, 1.0, 64.0)?;
        }

        self.validate_road_blend()?;
        if self.road.enabled && self.road.control_points.len() < 2 {
            return Err(RidgewayError::InvalidRoad(format!(
                "road is enabled but has {} control point(s); at least 2 are required",
                self.road.control_points.len()
            )));
        }

        Ok(())
    }

    /// Checks for the road blend parameters alone, used whenever a road is
    /// integrated (from the config or supplied by the caller).
    pub fn validate_road_blend(&self) -> Result<()> {
        let r = &self.road;
        if r.sample_density == 0 {
            return Err(RidgewayError::InvalidRoad(
                "road.sample_density must be at least 1".to_string(),
            ));
        }
        RidgewayError::check_range("road.influence_radius", r.influence_radius as f64, 1e-3, 1e6)?;
        RidgewayError::check_range("road.strength", r.strength as f64, 1e-3, 64.0)?;
        RidgewayError::check_range("road.shoulder_offset", r.shoulder_offset as f64, -1e3, 1e3)?;
        Ok(())
    }

    /// Parse from TOML text, applying the named preset before overrides.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(content)?;
        Self::from_toml_value(value)
    }

    /// Build from a TOML table: the table's `preset` (if any) supplies the
    /// defaults and every other key overrides them.
    pub fn from_toml_value(value: toml::Value) -> Result<Self> {
        let preset = match value.get("preset").and_then(|v| v.as_str()) {
            Some(name) => TerrainPreset::from_name(name).ok_or_else(|| {
                RidgewayError::InvalidConfig(format!(
                    "unknown preset '{}'; valid values: rolling_hills, mountains",
                    name
                ))
            })?,
            None => TerrainPreset::default(),
        };

        let mut base = toml::Value::try_from(Self::preset(preset))?;
        merge_toml(&mut base, value);
        if let toml::Value::Table(table) = &mut base {
            table.insert(
                "preset".to_string(),
                toml::Value::String(preset.name().to_string()),
            );
        }
        let config: TerrainConfig = base.try_into()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            RidgewayError::TomlParse(msg) => {
                RidgewayError::TomlParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Deep-merge `overlay` into `base`: tables merge key by key, anything else
/// in the overlay replaces the base value.
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
