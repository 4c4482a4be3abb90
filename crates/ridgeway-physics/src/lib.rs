//! Ridgeway Physics - Vehicle grounding on generated terrain
//!
//! Provides the per-tick path from vehicle motion to a grounded body:
//! - `WheelContactRaycaster` - straight-down rays against any `Raycastable`
//! - `TerrainCollider` - Rapier/parry heightfield built from a height grid
//! - `Vehicle` - kinematic planar motion and wheel layout (`WheelSource`)
//! - `VehicleTerrainFollower` - body height, pitch and roll from wheel contacts
//! - `RemoteVehicle` - network-driven transforms interpolated per frame

pub mod follower;
pub mod raycast;
pub mod vehicle;

pub use follower::{FollowOutcome, FollowerConfig, VehicleTerrainFollower};
pub use raycast::{RayHit, Raycastable, TerrainCollider, WheelContactRaycaster};
pub use vehicle::{
    DriveInput, RemoteVehicle, Vehicle, VehicleConfig, VehicleTransform, WheelAnchor, WheelSource,
};
