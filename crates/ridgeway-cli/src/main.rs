//! Ridgeway CLI - Headless terrain generation and vehicle driving

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config_cmd, drive, generate, mesh, probe};
use config::{Overrides, RidgewayConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ridgeway")]
#[command(about = "Deterministic road-carved terrain and vehicle grounding", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file applied over ~/.ridgeway/config.toml and ./ridgeway.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Terrain seed (integer or text)
    #[arg(long, global = true)]
    seed: Option<String>,

    /// Grid subdivisions per side
    #[arg(long, global = true)]
    segments: Option<u32>,

    /// Terrain preset (rolling_hills or mountains)
    #[arg(long, global = true)]
    preset: Option<String>,

    /// World-space edge length of the terrain square
    #[arg(long, global = true)]
    size: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate terrain and write image outputs
    Generate {
        /// 16-bit grayscale heightmap PNG
        #[arg(long)]
        heightmap: Option<PathBuf>,

        /// Vertex color PNG
        #[arg(long)]
        colors: Option<PathBuf>,

        /// Print generation stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query height, slope, road distance and color at a point
    Probe {
        /// World X
        #[arg(allow_hyphen_values = true)]
        x: f32,

        /// World Z
        #[arg(allow_hyphen_values = true)]
        z: f32,
    },

    /// Export the terrain mesh as Wavefront OBJ
    Mesh {
        /// Output file
        #[arg(long, default_value = "terrain.obj")]
        output: PathBuf,

        /// Cells per chunk side for the chunk summary
        #[arg(long, default_value = "64")]
        chunk_resolution: u32,
    },

    /// Drive a vehicle along the road and record its grounded transform
    Drive {
        /// Number of simulation ticks
        #[arg(long, default_value = "600")]
        ticks: u32,

        /// Seconds per tick
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// Throttle in [-1, 1]
        #[arg(long, default_value = "0.6", allow_hyphen_values = true)]
        throttle: f32,

        /// Start position "x,y,z" (defaults to the road start)
        #[arg(long, value_parser = parse_vec3)]
        start: Option<[f32; 3]>,

        /// CSV output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the resolved configuration as TOML
    Config,
}

/// Parse a comma-separated Vec3 string like "1.0,2.0,3.0"
fn parse_vec3(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    let z: f32 = parts[2].trim().parse().map_err(|e| format!("invalid z: {}", e))?;
    Ok([x, y, z])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let overrides = Overrides {
        seed: cli.seed,
        segments: cli.segments,
        preset: cli.preset,
        size: cli.size,
    };
    let config = RidgewayConfig::load(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Commands::Generate { heightmap, colors, json } => {
            generate::run(&config, heightmap.as_deref(), colors.as_deref(), json)
        }
        Commands::Probe { x, z } => probe::run(&config, x, z),
        Commands::Mesh {
            output,
            chunk_resolution,
        } => mesh::run(&config, &output, chunk_resolution),
        Commands::Drive {
            ticks,
            dt,
            throttle,
            start,
            output,
        } => drive::run(
            &config,
            &drive::DriveOptions {
                ticks,
                dt,
                throttle,
                start,
            },
            output.as_deref(),
        ),
        Commands::Config => config_cmd::run(&config),
    }
}
