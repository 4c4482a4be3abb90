//! Generate command

use crate::config::RidgewayConfig;
use anyhow::{Context, Result};
use ridgeway_terrain::{GeneratedTerrain, HeightmapGenerator, TerrainSurface};
use std::path::Path;

pub fn run(config: &RidgewayConfig, heightmap: Option<&Path>, colors: Option<&Path>, json: bool) -> Result<()> {
    let generator = HeightmapGenerator::new(config.terrain.clone()).context("Invalid terrain config")?;
    let generated = generator.generate().context("Terrain generation failed")?;
    let stats = stats_json(config, &generated);

    if let Some(path) = heightmap {
        generated
            .grid
            .save_png(path)
            .with_context(|| format!("Failed to write heightmap '{}'", path.display()))?;
        log::info!("Wrote heightmap to {}", path.display());
    }

    if let Some(path) = colors {
        let surface = TerrainSurface::from_generated(generated, config.terrain.colors.clone());
        surface
            .save_color_png(path)
            .with_context(|| format!("Failed to write color map '{}'", path.display()))?;
        log::info!("Wrote color map to {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Preset:       {}", config.terrain.preset.name());
        println!("Seed:         {}", config.terrain.seed.canonical());
        println!("Grid:         {0}x{0} vertices over {1} units", config.terrain.segments + 1, config.terrain.size);
        println!("Height range: {} .. {}", stats["min_height"], stats["max_height"]);
        println!("Road:         {}", stats["road_length"]);
        println!("Road cells:   {}", stats["road_cells"]);
        println!("Fingerprint:  {}", stats["fingerprint"].as_str().unwrap_or_default());
    }

    Ok(())
}

fn stats_json(config: &RidgewayConfig, generated: &GeneratedTerrain) -> serde_json::Value {
    let report = &generated.report;
    serde_json::json!({
        "preset": config.terrain.preset.name(),
        "seed": config.terrain.seed.canonical(),
        "segments": config.terrain.segments,
        "size": config.terrain.size,
        "min_height": generated.metadata.min_height,
        "max_height": generated.metadata.max_height,
        "road_length": generated.road.as_ref().map(|r| r.length()),
        "road_cells": report.road_cells,
        "smoothing_passes": report.smoothing_passes,
        "slope_limit_passes": report.slope_limit.map(|s| s.passes),
        "slope_limit_converged": report.slope_limit.map(|s| s.converged),
        "fingerprint": report.fingerprint.to_prefixed_hex(),
        "elapsed_secs": report.elapsed_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::small_config;

    #[test]
    fn stats_report_grid_and_road() {
        let config = small_config();
        let generated = HeightmapGenerator::new(config.terrain.clone()).unwrap().generate().unwrap();
        let stats = stats_json(&config, &generated);

        assert_eq!(stats["segments"], 32);
        assert_eq!(stats["seed"], "cli-test");
        assert!(stats["road_length"].as_f64().unwrap() > 0.0);
        assert!(stats["fingerprint"].as_str().unwrap().starts_with("sha256:"));
        assert!(stats["max_height"].as_f64().unwrap() >= stats["min_height"].as_f64().unwrap());
    }

    #[test]
    fn writes_both_images() {
        let config = small_config();
        let dir = std::env::temp_dir().join(format!("ridgeway_generate_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let heightmap = dir.join("height.png");
        let colors = dir.join("colors.png");

        run(&config, Some(&heightmap), Some(&colors), true).unwrap();
        assert!(heightmap.exists());
        assert!(colors.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
