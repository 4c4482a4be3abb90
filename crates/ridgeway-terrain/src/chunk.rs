//! Terrain chunk mesh generation

use ridgeway_core::Color;

use crate::heightmap::HeightGrid;

/// A single chunk of terrain geometry
#[derive(Debug, Clone)]
pub struct TerrainChunk {
    /// Grid position (column, row) in the chunk grid
    pub grid_pos: (u32, u32),
    /// Vertex positions in world space
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Linear RGBA vertex colors
    pub colors: Vec<[f32; 4]>,
    /// UV coordinates, normalized over the entire terrain
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices (CCW winding seen from above)
    pub indices: Vec<u32>,
    /// AABB minimum corner
    pub aabb_min: [f32; 3],
    /// AABB maximum corner
    pub aabb_max: [f32; 3],
}

impl TerrainChunk {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Number of chunks along each side for a given chunk resolution
pub fn chunk_count(segments: u32, resolution: u32) -> u32 {
    segments.div_ceil(resolution.max(1)).max(1)
}

/// Generate mesh data for a single terrain chunk.
///
/// `col` and `row` identify which chunk in the grid. `resolution` is the
/// number of quads per chunk edge; the last chunk on each side may be
/// narrower when `segments` isn't a multiple of it. Chunk vertices sit on
/// grid vertices, so neighbouring chunks share their edge heights exactly.
///
/// `colors` holds one color per grid vertex, row-major.
pub fn generate_chunk(grid: &HeightGrid, colors: &[Color], col: u32, row: u32, resolution: u32) -> TerrainChunk {
    let segments = grid.segments() as usize;
    let res = resolution.max(1) as usize;

    let c_start = (col as usize * res).min(segments);
    let r_start = (row as usize * res).min(segments);
    let c_end = (c_start + res).min(segments);
    let r_end = (r_start + res).min(segments);

    let quads_x = c_end - c_start;
    let quads_z = r_end - r_start;
    let verts_x = quads_x + 1;
    let verts_z = quads_z + 1;
    let vert_count = verts_x * verts_z;

    let mut positions = Vec::with_capacity(vert_count);
    let mut normals = Vec::with_capacity(vert_count);
    let mut vertex_colors = Vec::with_capacity(vert_count);
    let mut uvs = Vec::with_capacity(vert_count);

    let mut aabb_min = [f32::MAX; 3];
    let mut aabb_max = [f32::MIN; 3];

    for gr in r_start..=r_end {
        for gc in c_start..=c_end {
            let pos = grid.vertex(gc, gr).to_array();

            for i in 0..3 {
                aabb_min[i] = aabb_min[i].min(pos[i]);
                aabb_max[i] = aabb_max[i].max(pos[i]);
            }

            positions.push(pos);
            normals.push(grid.vertex_normal(gc, gr).to_array());
            vertex_colors.push(
                colors
                    .get(grid.index(gc, gr))
                    .copied()
                    .unwrap_or(Color::WHITE)
                    .to_array(),
            );
            uvs.push([gc as f32 / segments as f32, gr as f32 / segments as f32]);
        }
    }

    // Two triangles per quad
    let mut indices = Vec::with_capacity(quads_x * quads_z * 6);
    for qz in 0..quads_z {
        for qx in 0..quads_x {
            let tl = (qz * verts_x + qx) as u32;
            let tr = tl + 1;
            let bl = tl + verts_x as u32;
            let br = bl + 1;

            // First triangle (top-left, bottom-left, bottom-right)
            indices.push(tl);
            indices.push(bl);
            indices.push(br);

            // Second triangle (top-left, bottom-right, top-right)
            indices.push(tl);
            indices.push(br);
            indices.push(tr);
        }
    }

    TerrainChunk {
        grid_pos: (col, row),
        positions,
        normals,
        colors: vertex_colors,
        uvs,
        indices,
        aabb_min,
        aabb_max,
    }
}
