//! Vehicle transform, wheel layout and kinematic planar motion

use ridgeway_core::{Result, RidgewayError, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of a vehicle body.
///
/// Yaw rotates about +Y; at yaw 0 the vehicle faces +X with its right side
/// toward +Z. Pitch is nose-up positive, roll is right-side-up positive.
/// All angles are radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleTransform {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// Front wheel steering angle
    pub steering: f32,
}

impl VehicleTransform {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            ..Default::default()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.yaw.is_finite()
            && self.pitch.is_finite()
            && self.roll.is_finite()
            && self.steering.is_finite()
    }

    /// Horizontal heading
    pub fn forward(&self) -> Vec3 {
        Vec3::FORWARD.rotate_y(self.yaw)
    }

    /// Vehicle-local offset to world space, yaw only
    pub fn local_to_world(&self, offset: Vec3) -> Vec3 {
        self.position + offset.rotate_y(self.yaw)
    }

    /// World point to vehicle-local space, yaw only
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        (point - self.position).rotate_y(-self.yaw)
    }
}

/// A wheel mounting point relative to the vehicle origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelAnchor {
    pub name: String,
    /// Wheel center in vehicle-local space
    pub local_offset: Vec3,
    pub radius: f32,
}

impl WheelAnchor {
    pub fn new(name: impl Into<String>, local_offset: Vec3, radius: f32) -> Self {
        Self {
            name: name.into(),
            local_offset,
            radius,
        }
    }

    /// Four wheels on a rectangle `wheelbase` long and `track` wide,
    /// centers at `height` above the vehicle origin
    pub fn standard_four(wheelbase: f32, track: f32, height: f32, radius: f32) -> Vec<WheelAnchor> {
        let hx = wheelbase * 0.5;
        let hz = track * 0.5;
        vec![
            WheelAnchor::new("front_left", Vec3::new(hx, height, -hz), radius),
            WheelAnchor::new("front_right", Vec3::new(hx, height, hz), radius),
            WheelAnchor::new("rear_left", Vec3::new(-hx, height, -hz), radius),
            WheelAnchor::new("rear_right", Vec3::new(-hx, height, hz), radius),
        ]
    }
}

/// Produces the current world positions of a vehicle's wheels
pub trait WheelSource {
    /// Clears `out` and fills it with one position per wheel
    fn wheel_world_positions(&self, out: &mut Vec<Vec3>);
}

/// Handling and layout of a drivable vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub wheels: Vec<WheelAnchor>,
    /// Forward speed cap, units per second
    pub max_speed: f32,
    /// Units per second² at full throttle
    pub acceleration: f32,
    pub max_steering_degrees: f32,
    /// Axle separation used by the turning model
    pub wheelbase: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            wheels: WheelAnchor::standard_four(2.6, 1.6, 0.35, 0.35),
            max_speed: 30.0,
            acceleration: 12.0,
            max_steering_degrees: 30.0,
            wheelbase: 2.6,
        }
    }
}

impl VehicleConfig {
    pub fn validate(&self) -> Result<()> {
        RidgewayError::check_range("vehicle.max_speed", self.max_speed as f64, 0.0, 1e4)?;
        RidgewayError::check_range("vehicle.acceleration", self.acceleration as f64, 0.0, 1e4)?;
        RidgewayError::check_range(
            "vehicle.max_steering_degrees",
            self.max_steering_degrees as f64,
            0.0,
            89.0,
        )?;
        RidgewayError::check_range("vehicle.wheelbase", self.wheelbase as f64, 1e-3, 1e3)?;
        for wheel in &self.wheels {
            if !wheel.local_offset.is_finite() {
                return Err(RidgewayError::InvalidConfig(format!(
                    "wheel '{}' has a non-finite offset",
                    wheel.name
                )));
            }
            RidgewayError::check_range(&format!("wheel '{}' radius", wheel.name), wheel.radius as f64, 0.0, 100.0)?;
        }
        Ok(())
    }
}

/// Player input for one tick, each axis in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveInput {
    /// Forward positive, reverse/brake negative
    pub throttle: f32,
    /// Right positive
    pub steer: f32,
}

impl DriveInput {
    pub fn new(throttle: f32, steer: f32) -> Self {
        Self { throttle, steer }
    }

    /// Non-finite axes become 0; everything else is clamped to [-1, 1]
    pub fn sanitized(self) -> Self {
        let clean = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            throttle: clean(self.throttle),
            steer: clean(self.steer),
        }
    }
}

/// A locally simulated vehicle moved by a kinematic bicycle model.
///
/// Only the planar part of the transform is driven here; height and tilt
/// come from the terrain follower.
#[derive(Debug, Clone)]
pub struct Vehicle {
    config: VehicleConfig,
    pub transform: VehicleTransform,
    speed: f32,
}

impl Vehicle {
    pub fn new(config: VehicleConfig, transform: VehicleTransform) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transform,
            speed: 0.0,
        })
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn wheels(&self) -> &[WheelAnchor] {
        &self.config.wheels
    }

    /// Signed forward speed
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Advance planar motion by `dt` seconds. Non-positive or non-finite
    /// `dt` is ignored.
    pub fn drive(&mut self, input: DriveInput, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let input = input.sanitized();
        let cfg = &self.config;

        if input.throttle != 0.0 {
            self.speed += input.throttle * cfg.acceleration * dt;
        } else {
            // Coast down at half the acceleration rate
            let decel = cfg.acceleration * 0.5 * dt;
            self.speed = if self.speed.abs() <= decel {
                0.0
            } else {
                self.speed - decel * self.speed.signum()
            };
        }
        self.speed = self.speed.clamp(-cfg.max_speed * 0.5, cfg.max_speed);

        let steering = input.steer * cfg.max_steering_degrees.to_radians();
        self.transform.steering = steering;

        // Positive steer turns toward +Z (right), which is negative yaw
        let yaw_rate = -self.speed / cfg.wheelbase * steering.tan();
        self.transform.yaw += yaw_rate * dt;

        let step = self.transform.forward() * (self.speed * dt);
        self.transform.position.x += step.x;
        self.transform.position.z += step.z;
    }
}

impl WheelSource for Vehicle {
    fn wheel_world_positions(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend(
            self.config
                .wheels
                .iter()
                .map(|w| self.transform.local_to_world(w.local_offset)),
        );
    }
}

/// A vehicle driven by network updates rather than local input.
///
/// The network layer sets targets as they arrive; each frame the displayed
/// transform moves a fraction of the way toward the latest target.
#[derive(Debug, Clone, Default)]
pub struct RemoteVehicle {
    current: VehicleTransform,
    target: Option<VehicleTransform>,
}

impl RemoteVehicle {
    pub fn new(initial: VehicleTransform) -> Self {
        Self {
            current: initial,
            target: None,
        }
    }

    pub fn transform(&self) -> &VehicleTransform {
        &self.current
    }

    pub fn target(&self) -> Option<&VehicleTransform> {
        self.target.as_ref()
    }

    /// Accept a new target. Returns `false` and keeps the previous target if
    /// any component is non-finite.
    pub fn set_target(&mut self, target: VehicleTransform) -> bool {
        if !target.is_finite() {
            log::debug!("Rejected non-finite remote vehicle target {:?}", target);
            return false;
        }
        self.target = Some(target);
        true
    }

    /// Move `factor` (clamped to [0, 1]) of the way toward the target.
    /// Angles take the shortest way around.
    pub fn interpolate(&mut self, factor: f32) {
        let Some(target) = self.target else {
            return;
        };
        let f = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };

        self.current.position = self.current.position.lerp(target.position, f);
        self.current.yaw = lerp_angle(self.current.yaw, target.yaw, f);
        self.current.pitch = lerp_angle(self.current.pitch, target.pitch, f);
        self.current.roll = lerp_angle(self.current.roll, target.roll, f);
        self.current.steering += (target.steering - self.current.steering) * f;
    }
}

/// Interpolate between two angles along the shorter arc
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let delta = (to - from + PI).rem_euclid(TAU) - PI;
    from + delta * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn wheels_rotate_with_yaw() {
        let mut vehicle = Vehicle::new(VehicleConfig::default(), VehicleTransform::default()).unwrap();
        let mut out = Vec::new();
        vehicle.wheel_world_positions(&mut out);
        assert_eq!(out.len(), 4);
        assert!((out[0].x - 1.3).abs() < 1e-5);

        vehicle.transform.yaw = FRAC_PI_2;
        vehicle.transform.position = Vec3::new(10.0, 0.0, 10.0);
        vehicle.wheel_world_positions(&mut out);
        assert_eq!(out.len(), 4);
        for (wheel, world) in vehicle.wheels().iter().zip(&out) {
            let local = vehicle.transform.world_to_local(*world);
            assert!((local - wheel.local_offset).length() < 1e-5);
        }
    }

    #[test]
    fn throttle_moves_forward() {
        let mut vehicle = Vehicle::new(VehicleConfig::default(), VehicleTransform::default()).unwrap();
        for _ in 0..60 {
            vehicle.drive(DriveInput::new(1.0, 0.0), 1.0 / 60.0);
        }
        assert!(vehicle.speed() > 0.0);
        assert!(vehicle.transform.position.x > 0.0);
        assert!(vehicle.transform.position.z.abs() < 1e-5);
    }

    #[test]
    fn steering_right_turns_toward_positive_z() {
        let mut vehicle = Vehicle::new(VehicleConfig::default(), VehicleTransform::default()).unwrap();
        for _ in 0..120 {
            vehicle.drive(DriveInput::new(1.0, 1.0), 1.0 / 60.0);
        }
        assert!(vehicle.transform.yaw < 0.0);
        assert!(vehicle.transform.position.z > 0.0);
    }

    #[test]
    fn speed_is_capped() {
        let mut vehicle = Vehicle::new(VehicleConfig::default(), VehicleTransform::default()).unwrap();
        for _ in 0..1000 {
            vehicle.drive(DriveInput::new(1.0, 0.0), 0.1);
        }
        assert_eq!(vehicle.speed(), 30.0);
    }

    #[test]
    fn garbage_input_is_sanitized() {
        let input = DriveInput::new(f32::NAN, 7.0).sanitized();
        assert_eq!(input, DriveInput::new(0.0, 1.0));

        let mut vehicle = Vehicle::new(VehicleConfig::default(), VehicleTransform::default()).unwrap();
        vehicle.drive(DriveInput::new(f32::INFINITY, f32::NAN), 0.1);
        assert!(vehicle.transform.is_finite());
        vehicle.drive(DriveInput::new(1.0, 0.0), f32::NAN);
        assert!(vehicle.transform.is_finite());
    }

    #[test]
    fn remote_vehicle_rejects_non_finite_targets() {
        let mut remote = RemoteVehicle::new(VehicleTransform::default());
        let mut bad = VehicleTransform::default();
        bad.position.x = f32::NAN;
        assert!(!remote.set_target(bad));
        assert!(remote.target().is_none());
        remote.interpolate(0.5);
        assert_eq!(*remote.transform(), VehicleTransform::default());
    }

    #[test]
    fn remote_vehicle_converges_on_target() {
        let mut remote = RemoteVehicle::new(VehicleTransform::default());
        assert!(remote.set_target(VehicleTransform::new(Vec3::new(10.0, 2.0, -4.0), 1.0)));

        remote.interpolate(0.5);
        assert!((remote.transform().position.x - 5.0).abs() < 1e-5);

        for _ in 0..60 {
            remote.interpolate(0.2);
        }
        assert!((remote.transform().position.x - 10.0).abs() < 1e-3);
        assert!((remote.transform().yaw - 1.0).abs() < 1e-3);

        remote.interpolate(f32::NAN);
        assert!(remote.transform().is_finite());
    }

    #[test]
    fn angle_lerp_takes_short_way() {
        let a = lerp_angle(PI - 0.1, -PI + 0.1, 0.5);
        assert!((a.abs() - PI).abs() < 1e-4);
    }

    #[test]
    fn config_parses_from_toml() {
        let config: VehicleConfig = toml::from_str(
            r#"
max_speed = 45.0

[[wheels]]
name = "front"
local_offset = { x = 1.0, y = 0.3, z = 0.0 }
radius = 0.3

[[wheels]]
name = "rear"
local_offset = { x = -1.0, y = 0.3, z = 0.0 }
radius = 0.3
"#,
        )
        .unwrap();
        assert_eq!(config.wheels.len(), 2);
        assert_eq!(config.max_speed, 45.0);
        assert_eq!(config.wheelbase, 2.6);
        config.validate().unwrap();
    }
}
