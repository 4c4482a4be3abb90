//! In-place height grid filters, applied in order by the generator

use ridgeway_core::RoadPath;

use crate::config::{FalloffCurve, RoadBlendMode};
use crate::heightmap::HeightGrid;

/// Height differences within this much of the limit count as satisfied
pub const SLOPE_TOLERANCE: f32 = 1e-4;

/// Weights of the 3×3 smoothing kernel (sums to 1)
const KERNEL_CENTER: f32 = 0.25;
const KERNEL_EDGE: f32 = 0.125;
const KERNEL_CORNER: f32 = 0.0625;

/// Run `passes` of the 3×3 kernel over interior cells. Border cells keep
/// their values. Each pass reads from a snapshot of the previous pass.
pub fn smooth(grid: &mut HeightGrid, passes: u32) {
    let res = grid.resolution();
    let mut snapshot = grid.heights().to_vec();

    for _ in 0..passes {
        snapshot.copy_from_slice(grid.heights());
        let at = |c: usize, r: usize| snapshot[r * res + c];
        let heights = grid.heights_mut();

        for row in 1..res - 1 {
            for col in 1..res - 1 {
                let center = at(col, row);
                let edges = at(col - 1, row) + at(col + 1, row) + at(col, row - 1) + at(col, row + 1);
                let corners = at(col - 1, row - 1)
                    + at(col + 1, row - 1)
                    + at(col - 1, row + 1)
                    + at(col + 1, row + 1);

                heights[row * res + col] =
                    center * KERNEL_CENTER + edges * KERNEL_EDGE + corners * KERNEL_CORNER;
            }
        }
    }
}

/// Scale factor for a normalized Chebyshev distance `d` from the center.
///
/// 1 up to `start`, then `(1 - o)^2` or `(1 - o)^3` where `o` is the
/// overshoot fraction `(d - start) / (1 - start)`, reaching 0 at the border.
pub fn falloff_factor(d: f32, start: f32, curve: FalloffCurve) -> f32 {
    if d <= start {
        return 1.0;
    }
    let overshoot = ((d - start) / (1.0 - start)).clamp(0.0, 1.0);
    let k = 1.0 - overshoot;
    match curve {
        FalloffCurve::Quadratic => k * k,
        FalloffCurve::Cubic => k * k * k,
    }
}

pub fn apply_edge_falloff(grid: &mut HeightGrid, start: f32, curve: FalloffCurve) {
    let res = grid.resolution();
    let half = grid.size() * 0.5;

    for row in 0..res {
        let dz = grid.world_z(row).abs() / half;
        for col in 0..res {
            let dx = grid.world_x(col).abs() / half;
            let factor = falloff_factor(dx.max(dz), start, curve);
            if factor < 1.0 {
                let h = grid.get(col, row);
                grid.set(col, row, h * factor);
            }
        }
    }
}

/// Result of [`limit_slopes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlopeLimitOutcome {
    pub passes: u32,
    pub converged: bool,
}

/// Extra passes allowed past `min_passes` before giving up
const EXTRA_SLOPE_PASSES: u32 = 8;

/// Limit every step between cardinal neighbours to
/// `tan(max_slope_degrees) * cell_size`.
///
/// Each pass is a two-way clamp: peaks are cut down to the lower envelope
/// `min_j(h_j + d·dist)`, pits are filled up to the upper envelope
/// `max_j(h_j - d·dist)`, and every cell takes the midpoint of the two.
/// Both envelopes already satisfy the limit, so their midpoint does too.
/// Border cells take part when an interior neighbour needs them to.
///
/// At least `max(min_passes, 2)` passes run. Passing grids are unchanged by
/// further passes. `converged` is false only if some pair still exceeds the
/// limit (beyond [`SLOPE_TOLERANCE`]) after the extra passes.
pub fn limit_slopes(grid: &mut HeightGrid, max_slope_degrees: f32, min_passes: u32) -> SlopeLimitOutcome {
    let res = grid.resolution();
    let max_diff = max_slope_degrees.to_radians().tan() * grid.cell_size();
    let min_passes = min_passes.max(2);
    let max_passes = min_passes + EXTRA_SLOPE_PASSES;

    let mut lower = vec![0.0; res * res];
    let mut upper = vec![0.0; res * res];
    let mut passes = 0;
    loop {
        let violations = slope_violations(grid.heights(), res, max_diff);
        if passes >= min_passes && violations == 0 {
            return SlopeLimitOutcome {
                passes,
                converged: true,
            };
        }
        if passes >= max_passes {
            log::warn!(
                "Slope limiting stopped after {} passes with {} neighbour pairs over the limit",
                passes,
                violations
            );
            return SlopeLimitOutcome {
                passes,
                converged: false,
            };
        }

        let heights = grid.heights_mut();
        lower.copy_from_slice(heights);
        lower_envelope(&mut lower, res, max_diff);
        for (u, &h) in upper.iter_mut().zip(heights.iter()) {
            *u = -h;
        }
        lower_envelope(&mut upper, res, max_diff);
        for ((h, &lo), &up) in heights.iter_mut().zip(&lower).zip(&upper) {
            *h = 0.5 * (lo - up);
        }
        passes += 1;
    }
}

/// Number of cardinal neighbour pairs whose height difference exceeds
/// `max_diff` by more than [`SLOPE_TOLERANCE`]
pub fn slope_violations(heights: &[f32], res: usize, max_diff: f32) -> usize {
    let limit = max_diff + SLOPE_TOLERANCE;
    let mut count = 0;
    for row in 0..res {
        for col in 0..res {
            let i = row * res + col;
            if col + 1 < res && (heights[i] - heights[i + 1]).abs() > limit {
                count += 1;
            }
            if row + 1 < res && (heights[i] - heights[i + res]).abs() > limit {
                count += 1;
            }
        }
    }
    count
}

/// In-place `h_i = min_j(h_j + d·manhattan(i, j))` via a forward and a
/// backward raster sweep
fn lower_envelope(heights: &mut [f32], res: usize, d: f32) {
    for row in 0..res {
        for col in 0..res {
            let i = row * res + col;
            let mut h = heights[i];
            if col > 0 {
                h = h.min(heights[i - 1] + d);
            }
            if row > 0 {
                h = h.min(heights[i - res] + d);
            }
            heights[i] = h;
        }
    }
    for row in (0..res).rev() {
        for col in (0..res).rev() {
            let i = row * res + col;
            let mut h = heights[i];
            if col + 1 < res {
                h = h.min(heights[i + 1] + d);
            }
            if row + 1 < res {
                h = h.min(heights[i + res] + d);
            }
            heights[i] = h;
        }
    }
}

/// Blend weight at planar distance `d` from the road.
///
/// 1 on the centerline, `1 - (d/r)^strength` inside the radius, 0 at and
/// beyond it. Non-increasing in `d`.
pub fn road_influence(distance: f32, radius: f32, strength: f32) -> f32 {
    if !(distance < radius) {
        return 0.0;
    }
    if distance <= 0.0 {
        return 1.0;
    }
    (1.0 - (distance / radius).powf(strength)).clamp(0.0, 1.0)
}

/// Blend parameters for [`integrate_road`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadBlend {
    pub mode: RoadBlendMode,
    pub influence_radius: f32,
    pub strength: f32,
    pub shoulder_offset: f32,
}

/// Pull cells near the road toward their blend target. Targets in smooth
/// mode are read from a snapshot taken before any cell moves.
///
/// Returns the number of cells touched.
pub fn integrate_road(grid: &mut HeightGrid, road: &RoadPath, blend: &RoadBlend) -> usize {
    let res = grid.resolution();
    let snapshot = grid.heights().to_vec();

    // Cells outside the road's padded XZ bounds can't be in range
    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_z, mut max_z) = (f32::INFINITY, f32::NEG_INFINITY);
    for s in road.samples() {
        min_x = min_x.min(s.position.x);
        max_x = max_x.max(s.position.x);
        min_z = min_z.min(s.position.z);
        max_z = max_z.max(s.position.z);
    }
    let pad = blend.influence_radius;

    let mut touched = 0;
    for row in 0..res {
        let z = grid.world_z(row);
        if z < min_z - pad || z > max_z + pad {
            continue;
        }
        for col in 0..res {
            let x = grid.world_x(col);
            if x < min_x - pad || x > max_x + pad {
                continue;
            }

            let nearest = road.nearest_point(x, z);
            let w = road_influence(nearest.planar_distance, blend.influence_radius, blend.strength);
            if w <= 0.0 {
                continue;
            }

            let target = match blend.mode {
                RoadBlendMode::Flatten => nearest.elevation - blend.shoulder_offset,
                RoadBlendMode::Smooth => neighbourhood_mean(&snapshot, res, col, row),
            };
            let h = grid.get(col, row);
            grid.set(col, row, h + (target - h) * w);
            touched += 1;
        }
    }
    touched
}

/// Mean of the 3×3 block around (col, row), clipped at the grid edge
fn neighbourhood_mean(heights: &[f32], res: usize, col: usize, row: usize) -> f32 {
    let mut sum = 0.0;
    let mut count = 0;
    for r in row.saturating_sub(1)..=(row + 1).min(res - 1) {
        for c in col.saturating_sub(1)..=(col + 1).min(res - 1) {
            sum += heights[r * res + c];
            count += 1;
        }
    }
    sum / count as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeway_core::Vec3;

    fn spike(segments: u32, size: f32, height: f32) -> HeightGrid {
        let mut grid = HeightGrid::new(segments, size).unwrap();
        let mid = segments as usize / 2;
        grid.set(mid, mid, height);
        grid
    }

    #[test]
    fn smoothing_preserves_flat_grid() {
        let mut grid = HeightGrid::flat(8, 10.0, 2.5).unwrap();
        smooth(&mut grid, 3);
        assert!(grid.heights().iter().all(|&h| (h - 2.5).abs() < 1e-6));
    }

    #[test]
    fn smoothing_spreads_a_spike_and_keeps_borders() {
        let mut grid = spike(4, 10.0, 16.0);
        grid.set(0, 4, 5.0);
        smooth(&mut grid, 1);

        assert_eq!(grid.get(2, 2), 4.0);
        assert_eq!(grid.get(1, 2), 2.0);
        assert_eq!(grid.get(1, 1), 1.0);
        // Border untouched
        assert_eq!(grid.get(0, 4), 5.0);
        assert_eq!(grid.get(0, 2), 0.0);
    }

    #[test]
    fn falloff_curve_shape() {
        assert_eq!(falloff_factor(0.5, 0.7, FalloffCurve::Quadratic), 1.0);
        assert_eq!(falloff_factor(1.0, 0.7, FalloffCurve::Quadratic), 0.0);
        assert_eq!(falloff_factor(1.0, 0.7, FalloffCurve::Cubic), 0.0);
        let q = falloff_factor(0.85, 0.7, FalloffCurve::Quadratic);
        let c = falloff_factor(0.85, 0.7, FalloffCurve::Cubic);
        assert!((q - 0.25).abs() < 1e-5);
        assert!((c - 0.125).abs() < 1e-5);
    }

    #[test]
    fn edge_falloff_zeroes_border() {
        let mut grid = HeightGrid::flat(10, 100.0, 4.0).unwrap();
        apply_edge_falloff(&mut grid, 0.5, FalloffCurve::Quadratic);
        assert_eq!(grid.get(0, 5), 0.0);
        assert_eq!(grid.get(10, 10), 0.0);
        assert_eq!(grid.get(5, 5), 4.0);
        assert!(grid.get(8, 5) > 0.0 && grid.get(8, 5) < 4.0);
    }

    fn worst_step(grid: &HeightGrid) -> f32 {
        let res = grid.resolution();
        let mut worst = 0.0f32;
        for row in 0..res {
            for col in 0..res {
                let h = grid.get(col, row);
                if col + 1 < res {
                    worst = worst.max((h - grid.get(col + 1, row)).abs());
                }
                if row + 1 < res {
                    worst = worst.max((h - grid.get(col, row + 1)).abs());
                }
            }
        }
        worst
    }

    #[test]
    fn slope_limit_caps_neighbour_differences() {
        let mut grid = spike(8, 8.0, 50.0);
        let outcome = limit_slopes(&mut grid, 45.0, 2);
        assert!(outcome.converged);
        assert!(outcome.passes >= 2);

        let max_diff = 45f32.to_radians().tan() * grid.cell_size();
        assert!(worst_step(&grid) <= max_diff + SLOPE_TOLERANCE);
        assert_eq!(slope_violations(grid.heights(), grid.resolution(), max_diff), 0);
    }

    #[test]
    fn slope_limit_moves_border_when_interior_is_boxed_in() {
        // The only interior cell touches a border cell 100 above the rest
        let mut grid = HeightGrid::new(2, 2.0).unwrap();
        grid.set(1, 0, 100.0);
        let outcome = limit_slopes(&mut grid, 45.0, 2);

        assert!(outcome.converged);
        assert!(worst_step(&grid) <= 1.0 + SLOPE_TOLERANCE, "worst {}", worst_step(&grid));
        // Two-way: the tall cell came down and the low ones came up
        assert!(grid.get(1, 0) < 100.0);
        assert!(grid.get(1, 1) > 0.0);
    }

    #[test]
    fn slope_limit_handles_opposing_cliffs() {
        // A ridge of alternating highs and lows that a one-sided clamp
        // can only bounce between
        let heights: Vec<f32> = (0..17 * 17)
            .map(|i| if (i % 17 + i / 17) % 2 == 0 { 30.0 } else { -30.0 })
            .collect();
        let mut grid = HeightGrid::from_raw(heights, 16, 16.0).unwrap();
        let outcome = limit_slopes(&mut grid, 30.0, 2);

        let max_diff = 30f32.to_radians().tan();
        assert!(outcome.converged);
        assert!(worst_step(&grid) <= max_diff + SLOPE_TOLERANCE);
    }

    #[test]
    fn slope_limit_is_symmetric_about_zero() {
        let mut up = spike(6, 6.0, 20.0);
        let mut down = spike(6, 6.0, -20.0);
        limit_slopes(&mut up, 40.0, 2);
        limit_slopes(&mut down, 40.0, 2);
        for (a, b) in up.heights().iter().zip(down.heights()) {
            assert!((a + b).abs() < 1e-5);
        }
    }

    #[test]
    fn slope_limit_leaves_gentle_terrain_alone() {
        let heights: Vec<f32> = (0..81).map(|i| (i % 9) as f32 * 0.1).collect();
        let mut grid = HeightGrid::from_raw(heights.clone(), 8, 8.0).unwrap();
        let outcome = limit_slopes(&mut grid, 30.0, 2);
        assert_eq!(outcome.passes, 2);
        assert_eq!(grid.heights(), &heights[..]);
    }

    #[test]
    fn road_influence_is_monotonic() {
        for &strength in &[0.5f32, 1.0, 2.0, 3.0] {
            let mut prev = road_influence(0.0, 10.0, strength);
            assert_eq!(prev, 1.0);
            for i in 1..=120 {
                let w = road_influence(i as f32 * 0.1, 10.0, strength);
                assert!(w <= prev + 1e-6, "strength {} at d={}", strength, i as f32 * 0.1);
                prev = w;
            }
            assert_eq!(road_influence(10.0, 10.0, strength), 0.0);
            assert_eq!(road_influence(f32::NAN, 10.0, strength), 0.0);
        }
    }

    #[test]
    fn flatten_pulls_centerline_to_road_elevation() {
        let mut grid = HeightGrid::flat(20, 40.0, 6.0).unwrap();
        let road = RoadPath::new(
            vec![Vec3::new(-20.0, 1.0, 0.0), Vec3::new(20.0, 1.0, 0.0)],
            200,
        )
        .unwrap();
        let blend = RoadBlend {
            mode: RoadBlendMode::Flatten,
            influence_radius: 6.0,
            strength: 2.0,
            shoulder_offset: 0.25,
        };
        let touched = integrate_road(&mut grid, &road, &blend);
        assert!(touched > 0);

        // Row 10 is z = 0, right on the road
        assert!((grid.get(10, 10) - 0.75).abs() < 1e-4);
        // Row 20 is z = 20, far outside the radius
        assert_eq!(grid.get(10, 20), 6.0);
        // Partially blended in between
        let mid = grid.get(10, 12);
        assert!(mid > 0.75 && mid < 6.0);
    }

    #[test]
    fn smooth_mode_keeps_flat_ground_flat() {
        let mut grid = HeightGrid::flat(10, 20.0, 3.0).unwrap();
        let road = RoadPath::new(
            vec![Vec3::new(-10.0, 9.0, 0.0), Vec3::new(10.0, 9.0, 0.0)],
            50,
        )
        .unwrap();
        let blend = RoadBlend {
            mode: RoadBlendMode::Smooth,
            influence_radius: 5.0,
            strength: 1.0,
            shoulder_offset: 0.0,
        };
        integrate_road(&mut grid, &road, &blend);
        assert!(grid.heights().iter().all(|&h| (h - 3.0).abs() < 1e-6));
    }
}
