//! Ridgeway Core - Foundational types for the Ridgeway terrain sandbox
//!
//! This crate provides the types every other Ridgeway crate depends on:
//! - `Vec3`, `Color` - Spatial and color types
//! - `Seed` - Deterministic terrain seeds
//! - `Fingerprint` - SHA-256 fingerprints of generated terrain
//! - `spline::RoadPath` - Catmull-Rom road path with nearest-point queries
//! - Error types and Result alias

mod error;
mod hash;
mod seed;
pub mod spline;
mod types;

pub use error::{Result, RidgewayError};
pub use hash::Fingerprint;
pub use seed::Seed;
pub use spline::{RoadPath, RoadProjection, RoadSample};
pub use types::{Color, Vec3};
