//! Road path spline — open Catmull-Rom curve through ordered control points.
//!
//! The curve passes through every control point. Phantom endpoints are
//! created by reflecting the first and last segments outward, so the path
//! starts exactly at the first control point and ends at the last one.
//!
//! A dense set of arc-length-annotated samples is precomputed at
//! construction; nearest-point and distance queries work on those samples.

use crate::{Result, RidgewayError, Vec3};

/// Control points closer than this are treated as coincident.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Default number of sample intervals along the road.
pub const DEFAULT_SAMPLE_DENSITY: usize = 1000;

/// One precomputed sample along the road.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSample {
    pub position: Vec3,
    /// Arc length from the start of the road to this sample.
    pub distance: f32,
    /// Normalized direction of travel.
    pub tangent: Vec3,
    /// Curve parameter in [0, 1].
    pub t: f32,
}

/// Result of projecting a world position onto the road.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadProjection {
    /// Closest sample position (including its elevation).
    pub position: Vec3,
    /// Distance in the XZ plane from the query point to `position`.
    pub planar_distance: f32,
    /// Road elevation at the closest sample.
    pub elevation: f32,
    /// Arc length along the road at the closest sample.
    pub distance_along: f32,
    /// Curve parameter of the closest sample.
    pub t: f32,
}

/// Catmull-Rom interpolation for a single scalar value.
pub fn catmull_rom_scalar(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Derivative of [`catmull_rom_scalar`] with respect to `t`.
pub fn catmull_rom_scalar_derivative(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    0.5 * ((-p0 + p2)
        + 2.0 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t
        + 3.0 * (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t * t)
}

/// Catmull-Rom spline interpolation between four points.
pub fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        catmull_rom_scalar(p0.x, p1.x, p2.x, p3.x, t),
        catmull_rom_scalar(p0.y, p1.y, p2.y, p3.y, t),
        catmull_rom_scalar(p0.z, p1.z, p2.z, p3.z, t),
    )
}

/// Unnormalized tangent of a Catmull-Rom segment.
pub fn catmull_rom_derivative(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        catmull_rom_scalar_derivative(p0.x, p1.x, p2.x, p3.x, t),
        catmull_rom_scalar_derivative(p0.y, p1.y, p2.y, p3.y, t),
        catmull_rom_scalar_derivative(p0.z, p1.z, p2.z, p3.z, t),
    )
}

/// A smooth, non-looping road through ordered 3D control points.
///
/// Immutable after construction; every query is a pure function of the
/// query position and the precomputed samples, so a `RoadPath` can be shared
/// freely between threads.
#[derive(Debug, Clone)]
pub struct RoadPath {
    control_points: Vec<Vec3>,
    samples: Vec<RoadSample>,
    length: f32,
}

impl RoadPath {
    /// Build a road from at least two control points, precomputing
    /// `sample_density + 1` samples.
    pub fn new(control_points: Vec<Vec3>, sample_density: usize) -> Result<Self> {
        if control_points.len() < 2 {
            return Err(RidgewayError::InvalidRoad(format!(
                "road needs at least 2 control points, got {}",
                control_points.len()
            )));
        }
        if let Some(i) = control_points.iter().position(|p| !p.is_finite()) {
            return Err(RidgewayError::InvalidRoad(format!(
                "control point {} has a non-finite coordinate",
                i
            )));
        }
        if sample_density == 0 {
            return Err(RidgewayError::InvalidRoad(
                "sample density must be at least 1".to_string(),
            ));
        }

        let mut road = Self {
            control_points,
            samples: Vec::with_capacity(sample_density + 1),
            length: 0.0,
        };

        let mut distance = 0.0_f32;
        let mut prev = road.point_at(0.0);
        for i in 0..=sample_density {
            let t = i as f32 / sample_density as f32;
            let position = road.point_at(t);
            distance += (position - prev).length();
            prev = position;
            road.samples.push(RoadSample {
                position,
                distance,
                tangent: road.tangent_at(t),
                t,
            });
        }
        road.length = distance;

        Ok(road)
    }

    /// Build a road from `[x, y, z]` triples, as found in config files.
    pub fn from_points(points: &[[f32; 3]], sample_density: usize) -> Result<Self> {
        Self::new(points.iter().copied().map(Vec3::from_array).collect(), sample_density)
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    pub fn samples(&self) -> &[RoadSample] {
        &self.samples
    }

    /// Total arc length of the road (approximated by the sample polyline).
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Segment index, local parameter, and the four Catmull-Rom points for `t`.
    fn segment(&self, t: f32) -> (f32, [Vec3; 4]) {
        let pts = &self.control_points;
        let n = pts.len();
        let num_segs = n - 1;

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * num_segs as f32;
        let seg = (scaled.floor() as usize).min(num_segs - 1);
        let local_t = scaled - seg as f32;

        let p1 = pts[seg];
        let p2 = pts[seg + 1];
        let p0 = if seg == 0 { p1 * 2.0 - p2 } else { pts[seg - 1] };
        let p3 = if seg + 2 < n { pts[seg + 2] } else { p2 * 2.0 - p1 };

        (local_t, [p0, p1, p2, p3])
    }

    fn is_degenerate(p1: Vec3, p2: Vec3) -> bool {
        (p2 - p1).length() < DEGENERATE_EPSILON
    }

    /// Position on the curve; `t = 0` is the first control point, `t = 1`
    /// the last. `t` is clamped to [0, 1].
    pub fn point_at(&self, t: f32) -> Vec3 {
        let (local_t, [p0, p1, p2, p3]) = self.segment(t);
        if Self::is_degenerate(p1, p2) {
            return p1.lerp(p2, local_t);
        }
        catmull_rom(p0, p1, p2, p3, local_t)
    }

    /// Normalized direction of travel at `t`.
    ///
    /// Falls back to the segment chord, then the overall start-to-end
    /// direction, when the derivative vanishes. A road whose control points
    /// all coincide has no direction and yields `Vec3::ZERO`.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let (local_t, [p0, p1, p2, p3]) = self.segment(t);
        if !Self::is_degenerate(p1, p2) {
            let d = catmull_rom_derivative(p0, p1, p2, p3, local_t);
            if d.length() > DEGENERATE_EPSILON {
                return d.normalized();
            }
            return (p2 - p1).normalized();
        }

        let first = self.control_points[0];
        let last = self.control_points[self.control_points.len() - 1];
        (last - first).normalized()
    }

    /// Curve parameter at arc length `distance` from the start.
    pub fn t_at_distance(&self, distance: f32) -> f32 {
        let (i, frac) = self.locate_distance(distance);
        if i == 0 {
            return self.samples[0].t;
        }
        let a = &self.samples[i - 1];
        let b = &self.samples[i];
        a.t + (b.t - a.t) * frac
    }

    /// Position at arc length `distance` from the start, clamped to the road.
    pub fn point_at_distance(&self, distance: f32) -> Vec3 {
        let (i, frac) = self.locate_distance(distance);
        if i == 0 {
            return self.samples[0].position;
        }
        let a = &self.samples[i - 1];
        let b = &self.samples[i];
        a.position.lerp(b.position, frac)
    }

    /// Index of the first sample at or beyond `distance`, and the fraction
    /// of the way from the previous sample.
    fn locate_distance(&self, distance: f32) -> (usize, f32) {
        let d = if distance.is_nan() {
            0.0
        } else {
            distance.clamp(0.0, self.length)
        };
        let i = self.samples.partition_point(|s| s.distance < d);
        if i == 0 {
            return (0, 0.0);
        }
        let i = i.min(self.samples.len() - 1);
        let a = self.samples[i - 1].distance;
        let b = self.samples[i].distance;
        let span = b - a;
        let frac = if span > 0.0 { ((d - a) / span).clamp(0.0, 1.0) } else { 1.0 };
        (i, frac)
    }

    /// Closest precomputed sample to `(x, z)`, comparing only X/Z.
    ///
    /// This is a linear scan over every sample. Terrain generation calls it
    /// once per grid cell, which is acceptable for a one-shot build; a
    /// per-frame road-relative query (HUD, AI) at high sample density should
    /// put the samples in a spatial index instead. On equal distances the
    /// earliest sample wins.
    pub fn nearest_point(&self, x: f32, z: f32) -> RoadProjection {
        let mut best = &self.samples[0];
        let mut best_d2 = f32::INFINITY;
        for sample in &self.samples {
            let dx = sample.position.x - x;
            let dz = sample.position.z - z;
            let d2 = dx * dx + dz * dz;
            if d2 < best_d2 {
                best_d2 = d2;
                best = sample;
            }
        }

        RoadProjection {
            position: best.position,
            planar_distance: best_d2.sqrt(),
            elevation: best.position.y,
            distance_along: best.distance,
            t: best.t,
        }
    }
}
