//! Queryable terrain surface
//!
//! `TerrainSurface` owns a finished height grid, its metadata and the road it
//! was carved with. Every query is a pure read, so the surface can be shared
//! between threads behind an `Arc`.

use std::path::Path;

use ridgeway_core::{Color, Result, RidgewayError, RoadPath, Vec3};

use crate::chunk::{chunk_count, generate_chunk, TerrainChunk};
use crate::coloring;
use crate::config::{ColorConfig, TerrainConfig};
use crate::generator::{GeneratedTerrain, HeightmapGenerator};
use crate::heightmap::{HeightGrid, HeightmapMetadata};

/// A generated terrain ready for height, color and mesh queries
#[derive(Debug, Clone)]
pub struct TerrainSurface {
    grid: HeightGrid,
    metadata: HeightmapMetadata,
    road: Option<RoadPath>,
    colors: ColorConfig,
}

impl TerrainSurface {
    pub fn new(grid: HeightGrid, road: Option<RoadPath>, colors: ColorConfig) -> Self {
        let metadata = grid.metadata();
        Self {
            grid,
            metadata,
            road,
            colors,
        }
    }

    pub fn from_generated(generated: GeneratedTerrain, colors: ColorConfig) -> Self {
        Self {
            grid: generated.grid,
            metadata: generated.metadata,
            road: generated.road,
            colors,
        }
    }

    /// Generate and wrap in one step
    pub fn generate(config: &TerrainConfig) -> Result<Self> {
        let generated = HeightmapGenerator::new(config.clone())?.generate()?;
        Ok(Self::from_generated(generated, config.colors.clone()))
    }

    pub fn grid(&self) -> &HeightGrid {
        &self.grid
    }

    pub fn metadata(&self) -> &HeightmapMetadata {
        &self.metadata
    }

    pub fn road(&self) -> Option<&RoadPath> {
        self.road.as_ref()
    }

    pub fn size(&self) -> f32 {
        self.grid.size()
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.grid.contains(x, z)
    }

    /// Bilinear height at (x, z); `0.0` outside the terrain square
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.grid.sample(x, z).unwrap_or(0.0)
    }

    /// Surface normal; straight up outside the terrain square
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        if !self.contains(x, z) {
            return Vec3::UP;
        }
        self.grid.normal_at(x, z)
    }

    /// Slope angle in degrees, 0 for level ground
    pub fn slope_at(&self, x: f32, z: f32) -> f32 {
        self.normal_at(x, z).y.clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Planar distance from (x, z) to the road centerline
    pub fn road_distance(&self, x: f32, z: f32) -> Option<f32> {
        self.road.as_ref().map(|r| r.nearest_point(x, z).planar_distance)
    }

    pub fn color_at(&self, x: f32, z: f32) -> Color {
        coloring::terrain_color(
            self.height_at(x, z),
            self.slope_at(x, z),
            self.road_distance(x, z),
            &self.metadata,
            &self.colors,
        )
    }

    /// One color per grid vertex, row-major
    pub fn vertex_colors(&self) -> Vec<Color> {
        let res = self.grid.resolution();
        let mut colors = Vec::with_capacity(res * res);
        for row in 0..res {
            let z = self.grid.world_z(row);
            for col in 0..res {
                let x = self.grid.world_x(col);
                let slope = self.grid.vertex_normal(col, row).y.clamp(-1.0, 1.0).acos().to_degrees();
                colors.push(coloring::terrain_color(
                    self.grid.get(col, row),
                    slope,
                    self.road_distance(x, z),
                    &self.metadata,
                    &self.colors,
                ));
            }
        }
        colors
    }

    /// Split the surface into render chunks of `resolution` quads per edge
    pub fn chunks(&self, resolution: u32) -> Vec<TerrainChunk> {
        let colors = self.vertex_colors();
        let n = chunk_count(self.grid.segments(), resolution);
        let mut chunks = Vec::with_capacity((n * n) as usize);
        for row in 0..n {
            for col in 0..n {
                chunks.push(generate_chunk(&self.grid, &colors, col, row, resolution));
            }
        }
        chunks
    }

    /// Whole-grid geometry as a single triangle mesh.
    /// Returns (vertices, triangle_indices) suitable for a trimesh collider or export.
    pub fn trimesh_data(&self) -> (Vec<[f32; 3]>, Vec<[u32; 3]>) {
        let res = self.grid.resolution();
        let segments = self.grid.segments() as usize;

        let mut vertices = Vec::with_capacity(res * res);
        for row in 0..res {
            for col in 0..res {
                vertices.push(self.grid.vertex(col, row).to_array());
            }
        }

        let mut triangles = Vec::with_capacity(segments * segments * 2);
        for qz in 0..segments {
            for qx in 0..segments {
                let tl = (qz * res + qx) as u32;
                let tr = tl + 1;
                let bl = tl + res as u32;
                let br = bl + 1;
                triangles.push([tl, bl, br]);
                triangles.push([tl, br, tr]);
            }
        }

        (vertices, triangles)
    }

    /// Write the vertex colors as an RGB PNG, one pixel per grid vertex
    pub fn save_color_png(&self, path: &Path) -> Result<()> {
        let res = self.grid.resolution() as u32;
        let pixels: Vec<u8> = self
            .vertex_colors()
            .iter()
            .flat_map(|c| c.to_rgb8())
            .collect();

        let img: image::RgbImage = image::ImageBuffer::from_raw(res, res, pixels)
            .ok_or_else(|| RidgewayError::Image("color buffer size mismatch".to_string()))?;
        img.save(path).map_err(|e| {
            RidgewayError::Image(format!("Failed to write '{}': {}", path.display(), e))
        })
    }
}
