//! Splitting lakes into fixed-size tiles for culling and caching.

use bevy::math::{IVec2, Vec3};
use bevy_log::debug;

use super::Lake;
use crate::{
    world::{corner_to_world, CornerRect, Terrain},
    CHUNK_SIZE, MIN_CHUNK_CORNERS,
};

/// One rendered tile of a lake.
#[derive(Debug, Clone, PartialEq)]
pub struct LakeChunk {
    /// The `CHUNK_SIZE` tile this chunk was cut from.
    pub tile: CornerRect,
    /// Tight rectangle around the lake corners inside the tile.
    pub bounds: CornerRect,
    pub center: Vec3,
    pub radius: f32,
    pub valid_corners: usize,
    pub min_ground_height: f32,
    pub max_ground_height: f32,
}

impl LakeChunk {
    /// Rectangle that gets drawn: the tight bounds plus the shore ring,
    /// kept inside the tile so neighbouring chunks never overlap.
    pub fn render_rect(&self) -> CornerRect {
        self.bounds
            .grown(1)
            .intersection(&self.tile)
            .unwrap_or(self.bounds)
    }

    pub fn world_aabb(&self, level: f32) -> (Vec3, Vec3) {
        let rect = self.render_rect();
        (
            corner_to_world(rect.min.x as f32, rect.min.y as f32, level),
            corner_to_world(rect.max.x as f32, rect.max.y as f32, level),
        )
    }
}

/// Cuts `bounds` into `CHUNK_SIZE` tiles. Neighbouring tiles share their
/// edge corners; the last tile on each axis is cut short.
pub fn tile_rects(bounds: &CornerRect) -> Vec<CornerRect> {
    let mut tiles = Vec::new();
    for cy in (bounds.min.y..bounds.max.y).step_by(CHUNK_SIZE as usize) {
        for cx in (bounds.min.x..bounds.max.x).step_by(CHUNK_SIZE as usize) {
            tiles.push(CornerRect::new(
                IVec2::new(cx, cy),
                IVec2::new(
                    (cx + CHUNK_SIZE).min(bounds.max.x),
                    (cy + CHUNK_SIZE).min(bounds.max.y),
                ),
            ));
        }
    }
    tiles
}

/// Builds the chunks of a lake, dropping tiles with fewer than four lake
/// corners.
pub fn decompose_into_chunks<T: Terrain + ?Sized>(lake: &Lake, terrain: &T) -> Vec<LakeChunk> {
    let mut chunks = Vec::new();
    for tile in tile_rects(&lake.bounds) {
        let mut tight: Option<CornerRect> = None;
        let mut valid_corners = 0;
        let mut min_ground_height = f32::MAX;
        let mut max_ground_height = f32::MIN;

        for pos in tile.corners() {
            if !lake.has_corner(pos.x, pos.y) {
                continue;
            }
            valid_corners += 1;
            match &mut tight {
                Some(rect) => rect.expand(pos),
                None => tight = Some(CornerRect::from_point(pos)),
            }
            let ground = terrain.ground_height_at_corner(pos.x, pos.y);
            min_ground_height = min_ground_height.min(ground);
            max_ground_height = max_ground_height.max(ground);
        }

        let Some(bounds) = tight else {
            continue;
        };
        if valid_corners < MIN_CHUNK_CORNERS {
            debug!(
                "Dropping chunk {:?} of lake {}: only {} corners",
                tile, lake.id, valid_corners
            );
            continue;
        }

        let center = bounds.world_center();
        chunks.push(LakeChunk {
            tile,
            bounds,
            center: corner_to_world(center.x, center.y, lake.level),
            radius: bounds.world_half_diagonal(),
            valid_corners,
            min_ground_height,
            max_ground_height,
        });
    }
    chunks
}
