//! Cached geometry of one lake chunk.

use bevy::prelude::*;
use shared::{
    water::{Lake, LakeChunk},
    world::{corner_to_world, FogOfWar, Terrain},
};

use super::{
    backend::{DrawKey, QuadBatch},
    detail::WaterDetail,
    technique::Technique,
};

const FULL_QUAD: [u32; 4] = [0, 1, 2, 3];

/// Alphas closer than this count as one uniform alpha.
const UNIFORM_ALPHA_EPSILON: f32 = 1.0 / 512.0;

/// Vertex, alpha and index buffers of one chunk, built lazily and kept
/// across frames until the generation or the detail changes.
///
/// Vertices lie on the chunk's render rectangle at the water level, one per
/// lattice corner. Each emitted cell is one quad `a, a + row, a + row + 1,
/// a + 1` into that lattice.
#[derive(Debug, Default)]
pub struct ChunkCache {
    positions: Vec<Vec3>,
    alphas: Option<Vec<f32>>,
    indices: Vec<u32>,
    lattice_cells: usize,
    /// Corners of the drawn rectangle, in quad order.
    outline: [Vec3; 4],
    /// Set when every vertex of the chunk has the same alpha.
    uniform_alpha: Option<f32>,
    last_built_generation: Option<u64>,
    last_detail: Option<WaterDetail>,
    builds: u64,
}

/// Lattice coordinates from `min` to `max` at `stride`, always ending on `max`.
fn lattice(min: i32, max: i32, stride: i32) -> Vec<i32> {
    let mut coords: Vec<i32> = (min..=max).step_by(stride.max(1) as usize).collect();
    if coords.last() != Some(&max) {
        coords.push(max);
    }
    coords
}

impl ChunkCache {
    /// Whether the buffers were built for another generation or detail.
    pub fn is_dirty(&self, generation: u64, detail: WaterDetail) -> bool {
        self.last_built_generation != Some(generation) || self.last_detail != Some(detail)
    }

    /// Regenerates every buffer of `chunk`.
    pub fn rebuild(
        &mut self,
        lake: &Lake,
        chunk: &LakeChunk,
        terrain: &dyn Terrain,
        fog: &dyn FogOfWar,
        detail: WaterDetail,
        translucent: bool,
        generation: u64,
    ) {
        let rect = chunk.render_rect();
        let xs = lattice(rect.min.x, rect.max.x, detail.stride());
        let ys = lattice(rect.min.y, rect.max.y, detail.stride());
        let row = xs.len() as u32;

        self.positions.clear();
        let mut alphas = Vec::new();
        for &y in &ys {
            for &x in &xs {
                self.positions
                    .push(corner_to_world(x as f32, y as f32, lake.level));
                if translucent {
                    alphas.push(lake.alpha_at(terrain.ground_height_at_corner(x, y)));
                }
            }
        }

        self.uniform_alpha = if translucent {
            let min = alphas.iter().copied().fold(f32::MAX, f32::min);
            let max = alphas.iter().copied().fold(f32::MIN, f32::max);
            (max - min <= UNIFORM_ALPHA_EPSILON).then_some(max)
        } else {
            Some(1.0)
        };
        self.alphas = translucent.then_some(alphas);

        self.indices.clear();
        self.lattice_cells = (xs.len() - 1) * (ys.len() - 1);
        for j in 0..ys.len() - 1 {
            for i in 0..xs.len() - 1 {
                let min = IVec2::new(xs[i], ys[j]);
                let max = IVec2::new(xs[i + 1], ys[j + 1]);
                if !lake.has_any_corner(min, max) {
                    continue;
                }
                let fogged = (min.y..max.y)
                    .all(|cy| (min.x..max.x).all(|cx| fog.is_cell_fogged(cx, cy)));
                if fogged {
                    continue;
                }
                let a = j as u32 * row + i as u32;
                let b = a + row;
                self.indices.extend_from_slice(&[a, b, b + 1, a + 1]);
            }
        }

        let (min, max) = (rect.min, rect.max);
        self.outline = [
            corner_to_world(min.x as f32, min.y as f32, lake.level),
            corner_to_world(min.x as f32, max.y as f32, lake.level),
            corner_to_world(max.x as f32, max.y as f32, lake.level),
            corner_to_world(max.x as f32, min.y as f32, lake.level),
        ];

        self.last_built_generation = Some(generation);
        self.last_detail = Some(detail);
        self.builds += 1;
    }

    /// Quads in the full index buffer, ignoring the fast path.
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 4
    }

    /// True when no lattice cell was skipped.
    pub fn is_complete(&self) -> bool {
        self.lattice_cells > 0 && self.quad_count() == self.lattice_cells
    }

    /// Per-vertex alphas, present only when built translucent.
    pub fn alphas(&self) -> Option<&[f32]> {
        self.alphas.as_deref()
    }

    /// How many times the buffers were rebuilt.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// Alpha for drawing the whole chunk as one quad, if `technique` allows it.
    pub fn fast_path_alpha(&self, technique: &Technique) -> Option<f32> {
        if technique.uses_reflections() || !self.is_complete() {
            return None;
        }
        if technique.is_translucent() {
            self.uniform_alpha
        } else {
            Some(1.0)
        }
    }

    /// What to hand to the backend for this frame.
    pub fn batch(&self, key: DrawKey, technique: &Technique) -> QuadBatch<'_> {
        if let Some(alpha) = self.fast_path_alpha(technique) {
            return QuadBatch {
                key,
                version: self.builds * 2 + 1,
                positions: &self.outline,
                alphas: None,
                indices: &FULL_QUAD,
                alpha,
            };
        }
        QuadBatch {
            key,
            version: self.builds * 2,
            positions: &self.positions,
            alphas: if technique.is_translucent() {
                self.alphas.as_deref()
            } else {
                None
            },
            indices: &self.indices,
            alpha: 1.0,
        }
    }
}
