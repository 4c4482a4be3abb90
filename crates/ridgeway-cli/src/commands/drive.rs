//! Drive command
//!
//! Steers a kinematic vehicle along the road with a look-ahead target,
//! grounds it on the heightfield collider every tick and records the
//! resulting transform as CSV.

use crate::config::RidgewayConfig;
use anyhow::{Context, Result};
use ridgeway_core::Vec3;
use ridgeway_physics::{
    DriveInput, FollowOutcome, TerrainCollider, Vehicle, VehicleTerrainFollower, VehicleTransform,
};
use ridgeway_terrain::{TerrainLoader, TerrainSurface};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// How far ahead along the road the steering target sits
const LOOK_AHEAD: f32 = 8.0;

pub struct DriveOptions {
    pub ticks: u32,
    pub dt: f32,
    pub throttle: f32,
    pub start: Option<[f32; 3]>,
}

/// One recorded tick
#[derive(Debug, Clone, Copy)]
pub struct DriveSample {
    pub tick: u32,
    pub transform: VehicleTransform,
    pub speed: f32,
    pub outcome: FollowOutcome,
}

pub fn run(config: &RidgewayConfig, options: &DriveOptions, output: Option<&Path>) -> Result<()> {
    if !(options.dt.is_finite() && options.dt > 0.0) {
        anyhow::bail!("--dt must be a positive number of seconds");
    }

    let mut loader = TerrainLoader::spawn(config.terrain.clone());
    log::info!("Generating terrain in the background");
    let surface = loop {
        match loader.try_ready() {
            Some(result) => break result.context("Terrain generation failed")?,
            None => std::thread::sleep(Duration::from_millis(10)),
        }
    };

    let samples = simulate(config, &surface, options)?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    write_csv(&samples, &mut out)?;
    out.flush()?;

    if let Some(last) = samples.last() {
        let p = last.transform.position;
        log::info!(
            "Drove {} ticks, ended at ({:.2}, {:.2}, {:.2}) at {:.2} units/s",
            samples.len(),
            p.x,
            p.y,
            p.z,
            last.speed
        );
    }
    if let Some(path) = output {
        println!("Wrote {} ticks to {}", samples.len(), path.display());
    }

    Ok(())
}

/// Run the fixed-step loop: drive, then ground, once per tick
pub fn simulate(config: &RidgewayConfig, surface: &TerrainSurface, options: &DriveOptions) -> Result<Vec<DriveSample>> {
    let collider = TerrainCollider::from_surface(surface);
    let road = surface.road();

    let start = match (options.start, road) {
        (Some(p), _) => VehicleTransform::new(Vec3::new(p[0], p[1], p[2]), 0.0),
        (None, Some(road)) => {
            let p = road.point_at_distance(0.0);
            let t = road.tangent_at(0.0);
            VehicleTransform::new(p, (-t.z).atan2(t.x))
        }
        (None, None) => VehicleTransform::new(Vec3::new(0.0, 0.0, 0.0), 0.0),
    };

    let mut vehicle = Vehicle::new(config.vehicle.clone(), start).context("Invalid vehicle config")?;
    let mut follower = VehicleTerrainFollower::new(config.follower.clone(), vehicle.wheels());
    let max_steer = config.vehicle.max_steering_degrees.to_radians();

    let mut samples = Vec::with_capacity(options.ticks as usize);
    for tick in 0..options.ticks {
        let steer = match road {
            Some(road) => {
                let here = vehicle.transform.position;
                let along = road.nearest_point(here.x, here.z).distance_along;
                let target = road.point_at_distance((along + LOOK_AHEAD).min(road.length()));
                let local = vehicle.transform.world_to_local(target);
                if local.x.abs() + local.z.abs() > f32::EPSILON {
                    (local.z.atan2(local.x) / max_steer).clamp(-1.0, 1.0)
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        vehicle.drive(DriveInput::new(options.throttle, steer), options.dt);
        let outcome = follower.update_vehicle(&mut vehicle, surface, &collider);

        samples.push(DriveSample {
            tick,
            transform: vehicle.transform,
            speed: vehicle.speed(),
            outcome,
        });
    }

    Ok(samples)
}

pub fn write_csv(samples: &[DriveSample], out: &mut impl Write) -> Result<()> {
    writeln!(out, "tick,x,y,z,yaw,pitch,roll,speed,ground_height,raycast_hits,fallbacks")?;
    for s in samples {
        let t = &s.transform;
        writeln!(
            out,
            "{},{:.4},{:.4},{:.4},{:.5},{:.5},{:.5},{:.4},{:.4},{},{}",
            s.tick,
            t.position.x,
            t.position.y,
            t.position.z,
            t.yaw,
            t.pitch,
            t.roll,
            s.speed,
            s.outcome.ground_height,
            s.outcome.raycast_hits,
            s.outcome.fallbacks
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::small_config;

    fn options(ticks: u32) -> DriveOptions {
        DriveOptions {
            ticks,
            dt: 1.0 / 60.0,
            throttle: 0.6,
            start: None,
        }
    }

    #[test]
    fn vehicle_stays_grounded_near_the_road() {
        let config = small_config();
        let surface = TerrainSurface::generate(&config.terrain).unwrap();
        let samples = simulate(&config, &surface, &options(240)).unwrap();

        assert_eq!(samples.len(), 240);
        let last = samples.last().unwrap();
        assert!(last.transform.is_finite());
        assert!(last.speed > 0.0);
        assert_eq!(last.outcome.raycast_hits, 4);

        let p = last.transform.position;
        let road_distance = surface.road_distance(p.x, p.z).unwrap();
        assert!(road_distance < 10.0, "drifted {} from the road", road_distance);

        // Body sits at the ground height less the wheel offset, give or take smoothing
        let ground = surface.height_at(p.x, p.z);
        assert!((p.y - ground).abs() < 3.0);
    }

    #[test]
    fn simulation_is_deterministic() {
        let config = small_config();
        let surface = TerrainSurface::generate(&config.terrain).unwrap();
        let a = simulate(&config, &surface, &options(60)).unwrap();
        let b = simulate(&config, &surface, &options(60)).unwrap();
        let pa: Vec<_> = a.iter().map(|s| s.transform).collect();
        let pb: Vec<_> = b.iter().map(|s| s.transform).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn csv_has_header_and_one_row_per_tick() {
        let config = small_config();
        let surface = TerrainSurface::generate(&config.terrain).unwrap();
        let samples = simulate(&config, &surface, &options(10)).unwrap();
        let mut buf = Vec::new();
        write_csv(&samples, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("tick,x,y,z"));
        assert_eq!(lines[1].split(',').count(), 11);
    }
}
