//! Probe command

use crate::config::RidgewayConfig;
use anyhow::{Context, Result};
use ridgeway_physics::{TerrainCollider, WheelContactRaycaster};
use ridgeway_terrain::TerrainSurface;

pub fn run(config: &RidgewayConfig, x: f32, z: f32) -> Result<()> {
    let surface = TerrainSurface::generate(&config.terrain).context("Terrain generation failed")?;

    if !surface.contains(x, z) {
        log::warn!("({}, {}) is outside the terrain; heights fall back to 0", x, z);
    }

    let normal = surface.normal_at(x, z);
    let color = surface.color_at(x, z).to_rgb8();

    println!("Position:   ({}, {})", x, z);
    println!("Height:     {:.4}", surface.height_at(x, z));
    println!("Normal:     ({:.4}, {:.4}, {:.4})", normal.x, normal.y, normal.z);
    println!("Slope:      {:.2} deg", surface.slope_at(x, z));
    match surface.road_distance(x, z) {
        Some(d) => println!("Road:       {:.3} units away", d),
        None => println!("Road:       none"),
    }
    println!("Color:      #{:02x}{:02x}{:02x}", color[0], color[1], color[2]);

    let collider = TerrainCollider::from_surface(&surface);
    let start = surface.metadata().max_height + 1.0;
    let raycaster = WheelContactRaycaster::new(start, start - surface.metadata().min_height + 10.0);
    let hit = raycaster.cast_down(x, z, &collider, None);
    if hit.hit {
        println!("Collider:   {:.4} (ray travelled {:.3})", hit.point.y, hit.distance);
    } else {
        println!("Collider:   no hit");
    }

    Ok(())
}
