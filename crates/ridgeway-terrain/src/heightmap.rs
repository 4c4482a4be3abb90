//! Height grid storage and sampling

use std::path::Path;

use ridgeway_core::{Fingerprint, Result, RidgewayError, Vec3};
use serde::{Deserialize, Serialize};

/// Summary of a finished grid, computed once after generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightmapMetadata {
    pub min_height: f32,
    pub max_height: f32,
    pub size: f32,
    pub segments: u32,
}

impl HeightmapMetadata {
    /// Map a height into [0, 1] relative to the grid's range.
    /// A flat grid maps everything to 0.
    pub fn normalized(&self, height: f32) -> f32 {
        let range = self.max_height - self.min_height;
        if range <= f32::EPSILON {
            return 0.0;
        }
        ((height - self.min_height) / range).clamp(0.0, 1.0)
    }

    pub fn height_range(&self) -> f32 {
        self.max_height - self.min_height
    }
}

/// A square grid of `(segments + 1)²` elevations centered at the origin.
///
/// Row `r`, column `c` sits at world
/// `x = c / segments * size - size / 2`, `z = r / segments * size - size / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    /// Row-major elevations
    heights: Vec<f32>,
    segments: u32,
    size: f32,
}

impl HeightGrid {
    /// Allocate a grid filled with zeros
    pub fn new(segments: u32, size: f32) -> Result<Self> {
        Self::flat(segments, size, 0.0)
    }

    pub fn flat(segments: u32, size: f32, height: f32) -> Result<Self> {
        Self::check_dimensions(segments, size)?;
        let res = segments as usize + 1;
        Ok(Self {
            heights: vec![height; res * res],
            segments,
            size,
        })
    }

    /// Wrap existing row-major data
    pub fn from_raw(heights: Vec<f32>, segments: u32, size: f32) -> Result<Self> {
        Self::check_dimensions(segments, size)?;
        let res = segments as usize + 1;
        if heights.len() != res * res {
            return Err(RidgewayError::InvalidConfig(format!(
                "height grid with {} segments needs {} values, got {}",
                segments,
                res * res,
                heights.len()
            )));
        }
        Ok(Self {
            heights,
            segments,
            size,
        })
    }

    fn check_dimensions(segments: u32, size: f32) -> Result<()> {
        if segments < 2 {
            return Err(RidgewayError::InvalidConfig(format!(
                "segments must be at least 2, got {}",
                segments
            )));
        }
        if !(size.is_finite() && size > 0.0) {
            return Err(RidgewayError::InvalidConfig(format!(
                "size must be positive, got {}",
                size
            )));
        }
        Ok(())
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Samples per side (`segments + 1`)
    pub fn resolution(&self) -> usize {
        self.segments as usize + 1
    }

    pub fn cell_size(&self) -> f32 {
        self.size / self.segments as f32
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub(crate) fn heights_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.resolution() + col
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.heights[self.index(col, row)]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, height: f32) {
        let i = self.index(col, row);
        self.heights[i] = height;
    }

    pub fn world_x(&self, col: usize) -> f32 {
        (col as f32 / self.segments as f32) * self.size - self.size * 0.5
    }

    pub fn world_z(&self, row: usize) -> f32 {
        (row as f32 / self.segments as f32) * self.size - self.size * 0.5
    }

    /// World position of a grid vertex
    pub fn vertex(&self, col: usize, row: usize) -> Vec3 {
        Vec3::new(self.world_x(col), self.get(col, row), self.world_z(row))
    }

    /// Whether (x, z) lies on the terrain square, edges included
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let half = self.size * 0.5;
        (-half..=half).contains(&x) && (-half..=half).contains(&z)
    }

    /// Bilinear sample at world coordinates.
    /// Returns `None` outside the terrain square or for non-finite input.
    pub fn sample(&self, x: f32, z: f32) -> Option<f32> {
        if !self.contains(x, z) {
            return None;
        }
        Some(self.sample_clamped(x, z))
    }

    /// Bilinear sample with coordinates clamped onto the terrain square
    pub fn sample_clamped(&self, x: f32, z: f32) -> f32 {
        let half = self.size * 0.5;
        let cell = self.cell_size();
        let seg = self.segments as usize;

        let fx = ((x.clamp(-half, half) + half) / cell).max(0.0);
        let fz = ((z.clamp(-half, half) + half) / cell).max(0.0);

        let c0 = (fx as usize).min(seg - 1);
        let r0 = (fz as usize).min(seg - 1);
        let c1 = c0 + 1;
        let r1 = r0 + 1;

        let tx = (fx - c0 as f32).clamp(0.0, 1.0);
        let tz = (fz - r0 as f32).clamp(0.0, 1.0);

        let h00 = self.get(c0, r0);
        let h10 = self.get(c1, r0);
        let h01 = self.get(c0, r1);
        let h11 = self.get(c1, r1);

        let h0 = h00 * (1.0 - tx) + h10 * tx;
        let h1 = h01 * (1.0 - tx) + h11 * tx;

        h0 * (1.0 - tz) + h1 * tz
    }

    /// Surface normal from central differences one cell apart
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let eps = self.cell_size();

        let h_left = self.sample_clamped(x - eps, z);
        let h_right = self.sample_clamped(x + eps, z);
        let h_down = self.sample_clamped(x, z - eps);
        let h_up = self.sample_clamped(x, z + eps);

        let dx = (h_right - h_left) / (2.0 * eps);
        let dz = (h_up - h_down) / (2.0 * eps);

        Vec3::new(-dx, 1.0, -dz).normalized()
    }

    /// Normal of a grid vertex, from its neighbouring vertices
    pub fn vertex_normal(&self, col: usize, row: usize) -> Vec3 {
        let seg = self.segments as usize;
        let l = col.saturating_sub(1);
        let r = (col + 1).min(seg);
        let d = row.saturating_sub(1);
        let u = (row + 1).min(seg);
        let cell = self.cell_size();

        let dx = (self.get(r, row) - self.get(l, row)) / ((r - l) as f32 * cell);
        let dz = (self.get(col, u) - self.get(col, d)) / ((u - d) as f32 * cell);

        Vec3::new(-dx, 1.0, -dz).normalized()
    }

    pub fn metadata(&self) -> HeightmapMetadata {
        let (min_height, max_height) = self
            .heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            });
        HeightmapMetadata {
            min_height,
            max_height,
            size: self.size,
            segments: self.segments,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_grid(&self.heights, self.segments, self.size)
    }

    /// Write the grid as a 16-bit grayscale PNG, normalized to its own range
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let meta = self.metadata();
        let res = self.resolution() as u32;
        let pixels: Vec<u16> = self
            .heights
            .iter()
            .map(|&h| (meta.normalized(h) * 65535.0).round() as u16)
            .collect();

        let img: image::ImageBuffer<image::Luma<u16>, Vec<u16>> =
            image::ImageBuffer::from_raw(res, res, pixels).ok_or_else(|| {
                RidgewayError::Image("heightmap buffer size mismatch".to_string())
            })?;
        img.save(path).map_err(|e| {
            RidgewayError::Image(format!("Failed to write '{}': {}", path.display(), e))
        })
    }
}
