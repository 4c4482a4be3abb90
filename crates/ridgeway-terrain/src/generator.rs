//! Heightmap generation pipeline
//!
//! Stages run in a fixed order: base synthesis, smoothing, edge falloff,
//! slope limiting, road integration. Each stage is a pure function of the
//! grid it receives, so identical configs give bit-identical output.

use std::time::Instant;

use ridgeway_core::{Fingerprint, Result, RidgewayError, RoadPath};

use crate::coherent::CoherentNoise;
use crate::config::TerrainConfig;
use crate::filters::{self, RoadBlend, SlopeLimitOutcome};
use crate::heightmap::{HeightGrid, HeightmapMetadata};

/// What happened during one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub smoothing_passes: u32,
    /// `None` when slope limiting is disabled
    pub slope_limit: Option<SlopeLimitOutcome>,
    /// Cells moved by road integration
    pub road_cells: usize,
    pub fingerprint: Fingerprint,
    pub elapsed_secs: f64,
}

/// Output of [`HeightmapGenerator::generate`]
#[derive(Debug, Clone)]
pub struct GeneratedTerrain {
    pub grid: HeightGrid,
    pub metadata: HeightmapMetadata,
    pub road: Option<RoadPath>,
    pub report: GenerationReport,
}

/// Turns a validated [`TerrainConfig`] into a height grid
#[derive(Debug, Clone)]
pub struct HeightmapGenerator {
    config: TerrainConfig,
    noise: CoherentNoise,
}

impl HeightmapGenerator {
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;
        let noise = CoherentNoise::new(&config.seed);
        Ok(Self { config, noise })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// The road described by the config, if enabled
    pub fn build_road(&self) -> Result<Option<RoadPath>> {
        if !self.config.road.enabled {
            return Ok(None);
        }
        let road = RoadPath::from_points(&self.config.road.control_points, self.config.road.sample_density)?;
        Ok(Some(road))
    }

    /// Generate using the config's own road (or none)
    pub fn generate(&self) -> Result<GeneratedTerrain> {
        let road = self.build_road()?;
        self.generate_with_road(road)
    }

    /// Generate with a caller-supplied road, blended using the config's road
    /// parameters. `None` skips road integration.
    pub fn generate_with_road(&self, road: Option<RoadPath>) -> Result<GeneratedTerrain> {
        let cfg = &self.config;
        let start = Instant::now();

        let mut grid = HeightGrid::new(cfg.segments, cfg.size)?;

        let stage = Instant::now();
        self.synthesize(&mut grid);
        log::debug!(
            "Base synthesis: {}² samples in {:.1} ms",
            grid.resolution(),
            stage.elapsed().as_secs_f64() * 1000.0
        );

        if cfg.smoothing_passes > 0 {
            let stage = Instant::now();
            filters::smooth(&mut grid, cfg.smoothing_passes);
            log::debug!(
                "Smoothing: {} passes in {:.1} ms",
                cfg.smoothing_passes,
                stage.elapsed().as_secs_f64() * 1000.0
            );
        }

        if cfg.edge_falloff.enabled {
            filters::apply_edge_falloff(&mut grid, cfg.edge_falloff.start, cfg.edge_falloff.curve);
        }

        let slope_limit = if cfg.slope_limit.enabled {
            let stage = Instant::now();
            let outcome = filters::limit_slopes(
                &mut grid,
                cfg.slope_limit.max_slope_degrees,
                cfg.slope_limit.passes,
            );
            log::debug!(
                "Slope limit {}°: {} passes (converged: {}) in {:.1} ms",
                cfg.slope_limit.max_slope_degrees,
                outcome.passes,
                outcome.converged,
                stage.elapsed().as_secs_f64() * 1000.0
            );
            Some(outcome)
        } else {
            None
        };

        let mut road_cells = 0;
        if let Some(road) = &road {
            cfg.validate_road_blend()?;
            let stage = Instant::now();
            let blend = RoadBlend {
                mode: cfg.road.mode,
                influence_radius: cfg.road.influence_radius,
                strength: cfg.road.strength,
                shoulder_offset: cfg.road.shoulder_offset,
            };
            road_cells = filters::integrate_road(&mut grid, road, &blend);
            log::debug!(
                "Road integration: {} cells within {} of a {:.1} long road in {:.1} ms",
                road_cells,
                cfg.road.influence_radius,
                road.length(),
                stage.elapsed().as_secs_f64() * 1000.0
            );
        }

        if grid.heights().iter().any(|h| !h.is_finite()) {
            return Err(RidgewayError::Generation(
                "generated heightmap contains non-finite values".to_string(),
            ));
        }

        let metadata = grid.metadata();
        let fingerprint = grid.fingerprint();
        let elapsed_secs = start.elapsed().as_secs_f64();

        log::info!(
            "Generated {} terrain '{}': {}x{} over {} units, heights {:.2}..{:.2}, fingerprint {} ({:.1} ms)",
            cfg.preset.name(),
            cfg.seed,
            cfg.segments,
            cfg.segments,
            cfg.size,
            metadata.min_height,
            metadata.max_height,
            fingerprint,
            elapsed_secs * 1000.0
        );

        Ok(GeneratedTerrain {
            grid,
            metadata,
            road,
            report: GenerationReport {
                smoothing_passes: cfg.smoothing_passes,
                slope_limit,
                road_cells,
                fingerprint,
                elapsed_secs,
            },
        })
    }

    /// Stage 1: layered noise at world coordinates, remapped to heights
    fn synthesize(&self, grid: &mut HeightGrid) {
        let n = &self.config.noise;
        let res = grid.resolution();
        let scale = n.scale as f64;

        for row in 0..res {
            let z = grid.world_z(row) as f64 * scale;
            for col in 0..res {
                let x = grid.world_x(col) as f64 * scale;
                let value = self.noise.octave_sample(
                    x,
                    z,
                    n.octaves,
                    n.persistence as f64,
                    n.lacunarity as f64,
                );
                grid.set(col, row, n.base_height + value as f32 * n.height_multiplier);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainPreset;
    use ridgeway_core::Seed;

    fn small(seed: &str) -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.seed = Seed::from(seed);
        config.size = 100.0;
        config.segments = 32;
        config
    }

    #[test]
    fn identical_configs_are_bit_identical() {
        for preset in [TerrainPreset::RollingHills, TerrainPreset::Mountains] {
            let mut config = TerrainConfig::preset(preset);
            config.segments = 48;
            let a = HeightmapGenerator::new(config.clone()).unwrap().generate().unwrap();
            let b = HeightmapGenerator::new(config).unwrap().generate().unwrap();
            assert_eq!(a.grid.heights(), b.grid.heights());
            assert_eq!(a.report.fingerprint, b.report.fingerprint);
        }
    }

    #[test]
    fn different_seeds_give_different_terrain() {
        let a = HeightmapGenerator::new(small("one")).unwrap().generate().unwrap();
        let b = HeightmapGenerator::new(small("two")).unwrap().generate().unwrap();
        assert_ne!(a.report.fingerprint, b.report.fingerprint);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = small("x");
        config.segments = 1;
        assert!(HeightmapGenerator::new(config).is_err());

        let mut config = small("x");
        config.noise.octaves = 0;
        assert!(HeightmapGenerator::new(config).is_err());
    }

    #[test]
    fn falloff_flattens_the_border() {
        let mut config = small("border");
        config.road.enabled = false;
        let out = HeightmapGenerator::new(config).unwrap().generate().unwrap();
        let res = out.grid.resolution();
        for i in 0..res {
            assert_eq!(out.grid.get(i, 0), 0.0);
            assert_eq!(out.grid.get(0, i), 0.0);
            assert_eq!(out.grid.get(res - 1, i), 0.0);
        }
    }

    #[test]
    fn road_pulls_terrain_toward_its_surface() {
        let mut config = small("road");
        config.noise.height_multiplier = 20.0;
        config.edge_falloff.enabled = false;
        config.road.control_points = vec![[-50.0, 3.0, 0.0], [50.0, 3.0, 0.0]];
        config.road.shoulder_offset = 0.0;

        let generator = HeightmapGenerator::new(config.clone()).unwrap();
        let with_road = generator.generate().unwrap();
        let without = generator.generate_with_road(None).unwrap();

        assert!(with_road.report.road_cells > 0);
        assert_eq!(without.report.road_cells, 0);

        // Row 16 is z = 0, on the road
        for col in 4..28 {
            let h = with_road.grid.get(col, 16);
            assert!((h - 3.0).abs() < 1e-3, "col {} height {}", col, h);
        }
    }

    #[test]
    fn metadata_matches_grid() {
        let out = HeightmapGenerator::new(small("meta")).unwrap().generate().unwrap();
        let lo = out.grid.heights().iter().cloned().fold(f32::INFINITY, f32::min);
        let hi = out.grid.heights().iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(out.metadata.min_height, lo);
        assert_eq!(out.metadata.max_height, hi);
        assert_eq!(out.metadata.segments, 32);
    }

    #[test]
    fn mountains_report_slope_limiting() {
        let mut config = TerrainConfig::preset(TerrainPreset::Mountains);
        config.segments = 32;
        let out = HeightmapGenerator::new(config).unwrap().generate().unwrap();
        let outcome = out.report.slope_limit.unwrap();
        assert!(outcome.passes >= 2);
    }

    /// Steepest step in degrees over cardinal pairs that include an
    /// interior cell
    fn steepest_interior_step(grid: &HeightGrid) -> f32 {
        let res = grid.resolution();
        let interior = |c: usize, r: usize| c > 0 && r > 0 && c < res - 1 && r < res - 1;
        let mut worst = 0.0f32;
        for row in 0..res {
            for col in 0..res {
                for (c, r) in [(col + 1, row), (col, row + 1)] {
                    if c >= res || r >= res || !(interior(col, row) || interior(c, r)) {
                        continue;
                    }
                    let dh = (grid.get(col, row) - grid.get(c, r)).abs();
                    worst = worst.max((dh / grid.cell_size()).atan().to_degrees());
                }
            }
        }
        worst
    }

    #[test]
    fn steep_mountains_respect_the_slope_limit() {
        for falloff in [true, false] {
            for seed in ["0", "1", "ridge", "canyon"] {
                let mut config = TerrainConfig::preset(TerrainPreset::Mountains);
                config.seed = Seed::from(seed);
                config.segments = 64;
                config.noise.height_multiplier = 80.0;
                config.edge_falloff.enabled = falloff;
                config.road.enabled = false;
                let max_slope = config.slope_limit.max_slope_degrees;

                let out = HeightmapGenerator::new(config).unwrap().generate().unwrap();
                let outcome = out.report.slope_limit.unwrap();
                let worst = steepest_interior_step(&out.grid);
                let within = worst <= max_slope + 0.01;

                assert!(within, "seed {} falloff {}: {}° > {}°", seed, falloff, worst, max_slope);
                assert_eq!(outcome.converged, within);
            }
        }
    }
}
