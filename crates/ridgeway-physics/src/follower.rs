//! Keeps a vehicle body on the terrain surface
//!
//! Each tick the follower raycasts below every wheel, averages the ground
//! heights to place the body, and (with four or more wheels) derives pitch
//! and roll from the height differences between front/back and left/right
//! wheel groups.

use ridgeway_core::Vec3;
use ridgeway_terrain::TerrainSurface;
use serde::{Deserialize, Serialize};

use crate::raycast::{Raycastable, WheelContactRaycaster};
use crate::vehicle::{Vehicle, VehicleTransform, WheelAnchor, WheelSource};

/// Wheelbase or track width below this counts as zero
const MIN_AXLE_SPAN: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Rays start at least this high (and always above the highest terrain)
    pub raycast_start_height: f32,
    pub max_ray_distance: f32,
    /// Extra lift added to the computed body height
    pub height_offset: f32,
    /// 0 snaps to the target each tick; closer to 1 moves more slowly.
    /// Applied per tick, so the effective rate depends on frame rate.
    pub height_smoothing: f32,
    pub follow_rotation: bool,
    /// Same scheme as `height_smoothing`, for pitch and roll
    pub rotation_smoothing: f32,
    pub max_pitch_degrees: f32,
    pub max_roll_degrees: f32,
    /// Below this many wheels the follower samples the vehicle origin only
    pub min_wheels: usize,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            raycast_start_height: 100.0,
            max_ray_distance: 250.0,
            height_offset: 0.0,
            height_smoothing: 0.0,
            follow_rotation: true,
            rotation_smoothing: 0.0,
            max_pitch_degrees: 30.0,
            max_roll_degrees: 30.0,
            min_wheels: 2,
        }
    }
}

/// Diagnostics from one [`VehicleTerrainFollower::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowOutcome {
    /// Mean ground height under the sampled points
    pub ground_height: f32,
    /// Body height before smoothing
    pub target_height: f32,
    pub target_pitch: f32,
    pub target_roll: f32,
    /// Samples that came from a raycast hit
    pub raycast_hits: usize,
    /// Samples that fell back to `height_at`
    pub fallbacks: usize,
    /// True when too few wheels forced single-point following
    pub degraded: bool,
}

/// Per-vehicle terrain follower. Owns its scratch buffers, so steady-state
/// updates don't allocate.
#[derive(Debug, Clone)]
pub struct VehicleTerrainFollower {
    config: FollowerConfig,
    wheel_bottom_offset: f32,
    ground: Vec<f32>,
    wheel_scratch: Vec<Vec3>,
    warned_degraded: bool,
}

impl VehicleTerrainFollower {
    pub fn new(config: FollowerConfig, wheels: &[WheelAnchor]) -> Self {
        Self {
            config,
            wheel_bottom_offset: wheel_bottom_offset(wheels),
            ground: Vec::with_capacity(wheels.len()),
            wheel_scratch: Vec::with_capacity(wheels.len()),
            warned_degraded: false,
        }
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Mean wheel-center height above the vehicle origin minus mean radius
    pub fn wheel_bottom_offset(&self) -> f32 {
        self.wheel_bottom_offset
    }

    /// Place `transform` on the terrain given the current wheel world
    /// positions. `target` answers the raycasts; `surface` supplies the
    /// fallback height and the ray start height.
    pub fn update<R: Raycastable + ?Sized>(
        &mut self,
        transform: &mut VehicleTransform,
        wheels: &[Vec3],
        surface: &TerrainSurface,
        target: &R,
    ) -> FollowOutcome {
        let start_height = self
            .config
            .raycast_start_height
            .max(surface.metadata().max_height + 1.0);
        let raycaster = WheelContactRaycaster::new(start_height, self.config.max_ray_distance);

        let degraded = wheels.len() < self.config.min_wheels.max(1);
        if degraded && !self.warned_degraded {
            log::warn!(
                "Vehicle has {} wheel(s), need at least {}; following terrain at the vehicle origin",
                wheels.len(),
                self.config.min_wheels.max(1)
            );
            self.warned_degraded = true;
        }

        let mut raycast_hits = 0;
        let mut fallbacks = 0;
        self.ground.clear();

        let single_point = [transform.position];
        let points: &[Vec3] = if degraded { &single_point } else { wheels };
        for p in points {
            let hit = raycaster.cast_down(p.x, p.z, target, None);
            let h = if hit.hit {
                raycast_hits += 1;
                hit.point.y
            } else {
                fallbacks += 1;
                surface.height_at(p.x, p.z)
            };
            self.ground.push(h);
        }

        let ground_height = self.ground.iter().sum::<f32>() / self.ground.len() as f32;
        let target_height = ground_height - self.wheel_bottom_offset + self.config.height_offset;
        transform.position.y = smooth_toward(transform.position.y, target_height, self.config.height_smoothing);

        let (target_pitch, target_roll) = if !degraded && wheels.len() >= 4 {
            self.tilt_targets(transform, wheels)
        } else {
            (0.0, 0.0)
        };

        if self.config.follow_rotation {
            transform.pitch = smooth_toward(transform.pitch, target_pitch, self.config.rotation_smoothing);
            transform.roll = smooth_toward(transform.roll, target_roll, self.config.rotation_smoothing);
        }

        FollowOutcome {
            ground_height,
            target_height,
            target_pitch,
            target_roll,
            raycast_hits,
            fallbacks,
            degraded,
        }
    }

    /// Convenience for locally driven vehicles: pulls wheel positions from
    /// the vehicle itself.
    pub fn update_vehicle<R: Raycastable + ?Sized>(
        &mut self,
        vehicle: &mut Vehicle,
        surface: &TerrainSurface,
        target: &R,
    ) -> FollowOutcome {
        let mut wheels = std::mem::take(&mut self.wheel_scratch);
        vehicle.wheel_world_positions(&mut wheels);
        let outcome = self.update(&mut vehicle.transform, &wheels, surface, target);
        self.wheel_scratch = wheels;
        outcome
    }

    /// Pitch and roll targets (radians, clamped) from the sampled ground
    /// heights. An axis with an empty wheel group or zero span targets flat.
    fn tilt_targets(&self, transform: &VehicleTransform, wheels: &[Vec3]) -> (f32, f32) {
        let mut front = AxisGroup::default();
        let mut back = AxisGroup::default();
        let mut right = AxisGroup::default();
        let mut left = AxisGroup::default();

        for (wheel, &h) in wheels.iter().zip(&self.ground) {
            let local = transform.world_to_local(*wheel);
            if local.x > 0.0 {
                front.add(h, local.x);
            } else {
                back.add(h, local.x);
            }
            if local.z > 0.0 {
                right.add(h, local.z);
            } else {
                left.add(h, local.z);
            }
        }

        let pitch = axis_angle(&front, &back, self.config.max_pitch_degrees);
        let roll = axis_angle(&right, &left, self.config.max_roll_degrees);
        (pitch, roll)
    }
}

#[derive(Default)]
struct AxisGroup {
    height_sum: f32,
    coord_sum: f32,
    count: usize,
}

impl AxisGroup {
    fn add(&mut self, height: f32, coord: f32) {
        self.height_sum += height;
        self.coord_sum += coord;
        self.count += 1;
    }

    fn mean(&self) -> Option<(f32, f32)> {
        (self.count > 0).then(|| {
            let n = self.count as f32;
            (self.height_sum / n, self.coord_sum / n)
        })
    }
}

/// `atan2(Δh, span)` between the positive and negative group, clamped
fn axis_angle(positive: &AxisGroup, negative: &AxisGroup, max_degrees: f32) -> f32 {
    let (Some((hp, cp)), Some((hn, cn))) = (positive.mean(), negative.mean()) else {
        return 0.0;
    };
    let span = cp - cn;
    if span < MIN_AXLE_SPAN {
        return 0.0;
    }
    let limit = max_degrees.abs().to_radians();
    (hp - hn).atan2(span).clamp(-limit, limit)
}

/// Mean wheel-center height above the vehicle origin minus mean wheel radius
pub fn wheel_bottom_offset(wheels: &[WheelAnchor]) -> f32 {
    if wheels.is_empty() {
        return 0.0;
    }
    let n = wheels.len() as f32;
    let mean_y = wheels.iter().map(|w| w.local_offset.y).sum::<f32>() / n;
    let mean_radius = wheels.iter().map(|w| w.radius).sum::<f32>() / n;
    mean_y - mean_radius
}

/// Exponential step toward `target`. `smoothing` 0 snaps, 1 holds still.
fn smooth_toward(current: f32, target: f32, smoothing: f32) -> f32 {
    let s = if smoothing.is_finite() { smoothing.clamp(0.0, 1.0) } else { 0.0 };
    if s == 0.0 || !current.is_finite() {
        return target;
    }
    current + (target - current) * (1.0 - s)
}
