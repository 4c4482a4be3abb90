//! Mesh command

use crate::config::RidgewayConfig;
use anyhow::{Context, Result};
use ridgeway_terrain::TerrainSurface;
use std::io::Write;
use std::path::Path;

pub fn run(config: &RidgewayConfig, output: &Path, chunk_resolution: u32) -> Result<()> {
    if chunk_resolution == 0 {
        anyhow::bail!("--chunk-resolution must be at least 1");
    }

    let surface = TerrainSurface::generate(&config.terrain).context("Terrain generation failed")?;

    let file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create '{}'", output.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    let (vertices, triangles) = write_obj(&surface, &mut writer)?;
    writer.flush()?;

    let chunks = surface.chunks(chunk_resolution);
    let chunk_triangles: usize = chunks.iter().map(|c| c.triangle_count()).sum();

    println!("Wrote {} ({} vertices, {} triangles)", output.display(), vertices, triangles);
    println!(
        "{} chunks at {} cells per side ({} triangles)",
        chunks.len(),
        chunk_resolution,
        chunk_triangles
    );

    Ok(())
}

/// Write the full-resolution mesh as OBJ with per-vertex colors.
/// Returns the vertex and triangle counts.
pub fn write_obj(surface: &TerrainSurface, out: &mut impl Write) -> Result<(usize, usize)> {
    let (positions, triangles) = surface.trimesh_data();
    let colors = surface.vertex_colors();

    writeln!(out, "# ridgeway terrain")?;
    writeln!(out, "# fingerprint {}", surface.grid().fingerprint().to_prefixed_hex())?;
    for (p, c) in positions.iter().zip(&colors) {
        writeln!(out, "v {} {} {} {:.4} {:.4} {:.4}", p[0], p[1], p[2], c.r, c.g, c.b)?;
    }
    for t in &triangles {
        // OBJ indices are 1-based
        writeln!(out, "f {} {} {}", t[0] + 1, t[1] + 1, t[2] + 1)?;
    }

    Ok((positions.len(), triangles.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::small_config;

    #[test]
    fn obj_has_one_line_per_vertex_and_face() {
        let config = small_config();
        let surface = TerrainSurface::generate(&config.terrain).unwrap();
        let mut buf = Vec::new();
        let (vertices, triangles) = write_obj(&surface, &mut buf).unwrap();

        assert_eq!(vertices, 33 * 33);
        assert_eq!(triangles, 32 * 32 * 2);

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), vertices);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), triangles);
        assert!(!text.lines().any(|l| l.starts_with("f ") && l.split(' ').any(|i| i == "0")));
    }
}
