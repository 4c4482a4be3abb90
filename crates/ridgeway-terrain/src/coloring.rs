//! Vertex color derivation

use ridgeway_core::Color;

use crate::config::{ColorBand, ColorConfig, ColorMode};
use crate::heightmap::HeightmapMetadata;

/// Normalized-height width of the blend across a band boundary
pub const BAND_BLEND: f32 = 0.05;

/// Color for normalized height `t` from an ascending band table.
/// Heights just above a boundary blend in from the band below.
pub fn band_color(t: f32, bands: &[ColorBand], fallback: Color) -> Color {
    let Some(last) = bands.last() else {
        return fallback;
    };

    for (i, band) in bands.iter().enumerate() {
        if t <= band.max {
            let color = Color::from_hex(band.color);
            if i > 0 {
                let prev = &bands[i - 1];
                if t < prev.max + BAND_BLEND {
                    let f = (t - prev.max) / BAND_BLEND;
                    return Color::from_hex(prev.color).lerp(color, f);
                }
            }
            return color;
        }
    }
    Color::from_hex(last.color)
}

/// Color of natural ground, ignoring the road
pub fn natural_color(height: f32, slope_degrees: f32, meta: &HeightmapMetadata, cfg: &ColorConfig) -> Color {
    let t = meta.normalized(height);
    let base = Color::from_hex(cfg.base_color);

    let color = match cfg.mode {
        ColorMode::HeightBands => band_color(t, &cfg.bands, base),
        ColorMode::SingleTone => {
            let shade = 0.75 + 0.25 * t;
            Color::new(base.r * shade, base.g * shade, base.b * shade, base.a)
        }
    };

    if cfg.slope_blend && cfg.slope_full_degrees > cfg.slope_start_degrees {
        let w = (slope_degrees - cfg.slope_start_degrees)
            / (cfg.slope_full_degrees - cfg.slope_start_degrees);
        if w > 0.0 {
            return color.lerp(Color::from_hex(cfg.rock_color), w);
        }
    }
    color
}

/// Full terrain color at a point. `road_distance` is the planar distance to
/// the road centerline, or `None` when there is no road.
pub fn terrain_color(
    height: f32,
    slope_degrees: f32,
    road_distance: Option<f32>,
    meta: &HeightmapMetadata,
    cfg: &ColorConfig,
) -> Color {
    let natural = natural_color(height, slope_degrees, meta, cfg);

    let Some(d) = road_distance else {
        return natural;
    };

    let half_width = cfg.road_width * 0.5;
    if d <= half_width {
        return Color::from_hex(cfg.road_color);
    }
    if cfg.shoulder_width > 0.0 && d < half_width + cfg.shoulder_width {
        let f = (d - half_width) / cfg.shoulder_width;
        return Color::from_hex(cfg.shoulder_color).lerp(natural, f);
    }
    natural
}
