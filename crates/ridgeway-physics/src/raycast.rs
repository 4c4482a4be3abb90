//! Downward ground raycasts for wheel contact

use rapier3d::na::DMatrix;
use rapier3d::parry::query::RayCast;
use rapier3d::parry::shape::HeightField;
use rapier3d::prelude::*;
use ridgeway_core::Vec3;
use ridgeway_terrain::{HeightGrid, TerrainSurface};

/// Anything a straight-down ray can hit
pub trait Raycastable {
    /// Distance from `origin` down to the first surface within
    /// `max_distance`, or `None` on a miss.
    fn cast_ray_down(&self, origin: Vec3, max_distance: f32) -> Option<f32>;
}

impl<T: Raycastable + ?Sized> Raycastable for &T {
    fn cast_ray_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        (**self).cast_ray_down(origin, max_distance)
    }
}

impl<T: Raycastable + ?Sized> Raycastable for std::sync::Arc<T> {
    fn cast_ray_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        (**self).cast_ray_down(origin, max_distance)
    }
}

/// Analytic intersection with the bilinear surface
impl Raycastable for TerrainSurface {
    fn cast_ray_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        if !origin.is_finite() || !self.contains(origin.x, origin.z) {
            return None;
        }
        let distance = origin.y - self.height_at(origin.x, origin.z);
        (distance >= 0.0 && distance <= max_distance).then_some(distance)
    }
}

/// Result of a single downward cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub hit: bool,
    /// Contact point, or `(x, 0, z)` on a miss
    pub point: Vec3,
    /// Distance travelled, or the full ray length on a miss
    pub distance: f32,
}

impl RayHit {
    fn miss(x: f32, z: f32, max_distance: f32) -> Self {
        Self {
            hit: false,
            point: Vec3::new(x, 0.0, z),
            distance: max_distance,
        }
    }
}

/// Casts straight down from a fixed height above the terrain.
///
/// Holds no buffers; every cast works on the stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelContactRaycaster {
    pub start_height: f32,
    pub max_distance: f32,
}

impl Default for WheelContactRaycaster {
    fn default() -> Self {
        Self {
            start_height: 100.0,
            max_distance: 250.0,
        }
    }
}

impl WheelContactRaycaster {
    pub fn new(start_height: f32, max_distance: f32) -> Self {
        Self {
            start_height,
            max_distance,
        }
    }

    /// Cast from `(x, start_height, z)`. `max_distance` overrides the
    /// configured ray length for this cast.
    pub fn cast_down<R: Raycastable + ?Sized>(
        &self,
        x: f32,
        z: f32,
        target: &R,
        max_distance: Option<f32>,
    ) -> RayHit {
        let max = max_distance.unwrap_or(self.max_distance);
        if !(max > 0.0) || !x.is_finite() || !z.is_finite() {
            return RayHit::miss(x, z, max.max(0.0));
        }

        let origin = Vec3::new(x, self.start_height, z);
        match target.cast_ray_down(origin, max) {
            Some(distance) => RayHit {
                hit: true,
                point: Vec3::new(x, self.start_height - distance, z),
                distance,
            },
            None => RayHit::miss(x, z, max),
        }
    }
}

/// Heightfield collision shape built from a height grid.
///
/// Rows of the height matrix run along Z and columns along X, matching the
/// grid's layout, and the shape is centered on the origin like the grid.
///
/// Each cell is two triangles, while [`TerrainSurface::height_at`] is
/// bilinear. Both agree at grid vertices and on planar cells; inside a
/// twisted cell they differ by up to `|h00 - h10 - h01 + h11| / 4`. A tick
/// that mixes collider hits with `height_at` fallbacks can see that gap.
#[derive(Debug, Clone)]
pub struct TerrainCollider {
    shape: HeightField,
}

impl TerrainCollider {
    pub fn from_grid(grid: &HeightGrid) -> Self {
        let res = grid.resolution();
        let heights = DMatrix::from_fn(res, res, |row, col| grid.get(col, row));
        let shape = HeightField::new(heights, vector![grid.size(), 1.0, grid.size()]);
        Self { shape }
    }

    pub fn from_surface(surface: &TerrainSurface) -> Self {
        Self::from_grid(surface.grid())
    }

    pub fn shape(&self) -> &HeightField {
        &self.shape
    }

    /// A fixed Rapier collider sharing this heightfield
    pub fn collider(&self) -> Collider {
        ColliderBuilder::heightfield(self.shape.heights().clone(), *self.shape.scale())
            .friction(0.8)
            .build()
    }
}

impl Raycastable for TerrainCollider {
    fn cast_ray_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        if !origin.is_finite() {
            return None;
        }
        let ray = Ray::new(point![origin.x, origin.y, origin.z], vector![0.0, -1.0, 0.0]);
        self.shape.cast_local_ray(&ray, max_distance, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeway_terrain::ColorConfig;

    fn flat_surface(height: f32) -> TerrainSurface {
        let grid = HeightGrid::flat(20, 100.0, height).unwrap();
        TerrainSurface::new(grid, None, ColorConfig::default())
    }

    #[test]
    fn flat_terrain_raycast_matches_height() {
        let surface = flat_surface(5.0);
        let collider = TerrainCollider::from_surface(&surface);
        let raycaster = WheelContactRaycaster::new(100.0, 200.0);

        for &(x, z) in &[(1.3, 2.7), (-20.4, 11.9), (33.3, -44.1)] {
            let analytic = raycaster.cast_down(x, z, &surface, None);
            let shape = raycaster.cast_down(x, z, &collider, None);
            assert!(analytic.hit && shape.hit);
            assert!((analytic.point.y - 5.0).abs() < 1e-4);
            assert!((shape.point.y - 5.0).abs() < 1e-3);
            assert!((shape.distance - 95.0).abs() < 1e-3);
        }
    }

    #[test]
    fn miss_outside_terrain() {
        let surface = flat_surface(5.0);
        let collider = TerrainCollider::from_surface(&surface);
        let raycaster = WheelContactRaycaster::default();

        for hit in [
            raycaster.cast_down(400.0, 0.0, &surface, None),
            raycaster.cast_down(400.0, 0.0, &collider, None),
        ] {
            assert!(!hit.hit);
            assert_eq!(hit.point, Vec3::new(400.0, 0.0, 0.0));
        }
    }

    #[test]
    fn short_ray_misses() {
        let surface = flat_surface(5.0);
        let raycaster = WheelContactRaycaster::new(100.0, 200.0);
        let hit = raycaster.cast_down(0.5, 0.5, &surface, Some(10.0));
        assert!(!hit.hit);
        assert_eq!(hit.distance, 10.0);
    }

    #[test]
    fn collider_follows_sloped_grid() {
        // Height rises with column index
        let res = 11usize;
        let heights = (0..res * res).map(|i| (i % res) as f32).collect();
        let grid = HeightGrid::from_raw(heights, 10, 100.0).unwrap();
        let surface = TerrainSurface::new(grid, None, ColorConfig::default());
        let collider = TerrainCollider::from_surface(&surface);
        let raycaster = WheelContactRaycaster::new(50.0, 100.0);

        for &(x, z) in &[(-37.0, 3.0), (12.5, -8.2), (41.0, 22.0)] {
            let hit = raycaster.cast_down(x, z, &collider, None);
            assert!(hit.hit);
            assert!((hit.point.y - surface.height_at(x, z)).abs() < 1e-3);
        }
    }

    #[test]
    fn twisted_cell_gap_stays_within_the_twist() {
        // One raised corner: the cell is not planar
        let mut grid = HeightGrid::new(2, 4.0).unwrap();
        grid.set(1, 1, 8.0);
        let surface = TerrainSurface::new(grid, None, ColorConfig::default());
        let collider = TerrainCollider::from_surface(&surface);
        let raycaster = WheelContactRaycaster::new(50.0, 100.0);

        // Cell spanning columns/rows 0..=1 has corners 0, 0, 0, 8
        let twist = 8.0f32;
        let (x, z) = (-1.0, -1.0);
        let hit = raycaster.cast_down(x, z, &collider, None);
        assert!(hit.hit);
        let gap = (hit.point.y - surface.height_at(x, z)).abs();
        assert!(gap <= twist / 4.0 + 1e-3, "gap {}", gap);

        // At the shared vertex both representations agree
        let hit = raycaster.cast_down(1e-3, 1e-3, &collider, None);
        assert!((hit.point.y - surface.height_at(1e-3, 1e-3)).abs() < 0.02);
    }

    #[test]
    fn collider_builds_rapier_heightfield() {
        let collider = TerrainCollider::from_surface(&flat_surface(1.0)).collider();
        assert!(collider.shape().as_heightfield().is_some());
    }
}
