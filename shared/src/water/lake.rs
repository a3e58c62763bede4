//! A single body of water with a flat level.

use bevy::math::{IVec2, Mat4, Vec2, Vec3};

use super::{LakeChunk, LakeId, LakeRecord};
use crate::{
    world::{corner_to_world, CornerRect},
    DEFAULT_ALPHA_BASE, DEFAULT_ALPHA_MULTIPLIER, DEFAULT_TEXTURE_ROTATION_DEGREES,
    DEFAULT_WAVE_VECTOR,
};

/// One body of water with a flat surface.
///
/// `bounds` covers the lake's corners plus a one corner shore ring, and the
/// corner mask holds one flag per corner of `bounds`. Only the seed, the
/// search bounds and the level are persisted; the rest is found again on load.
#[derive(Debug, Clone)]
pub struct Lake {
    pub id: LakeId,
    /// Height of the water surface.
    pub level: f32,
    /// Corner the flood fill started from.
    pub origin: IVec2,
    /// Rectangle the lake was delineated within. This is what gets saved.
    pub search_bounds: CornerRect,
    /// Bounding rectangle of the lake corners, grown by one for the shore.
    pub bounds: CornerRect,
    corner_mask: Vec<bool>,
    corner_count: usize,
    /// Culling sphere, in world space.
    pub center: Vec3,
    pub radius: f32,
    pub chunks: Vec<LakeChunk>,
    /// Texture scroll direction.
    pub wave_vector: Vec2,
    /// Texture rotation around the surface normal, in degrees.
    pub texture_rotation: f32,
    pub alpha_multiplier: f32,
    pub alpha_base: f32,
}

impl Lake {
    /// Creates a lake from a finished flood fill. `corner_mask` is indexed
    /// row-major over `bounds`.
    pub(crate) fn new(
        id: LakeId,
        level: f32,
        origin: IVec2,
        search_bounds: CornerRect,
        bounds: CornerRect,
        corner_mask: Vec<bool>,
    ) -> Self {
        debug_assert_eq!(corner_mask.len(), bounds.corner_count());
        let corner_count = corner_mask.iter().filter(|&&valid| valid).count();
        let center = bounds.world_center();
        Self {
            id,
            level,
            origin,
            search_bounds,
            bounds,
            corner_mask,
            corner_count,
            center: corner_to_world(center.x, center.y, level),
            radius: bounds.world_half_diagonal(),
            chunks: Vec::new(),
            wave_vector: DEFAULT_WAVE_VECTOR,
            texture_rotation: DEFAULT_TEXTURE_ROTATION_DEGREES,
            alpha_multiplier: DEFAULT_ALPHA_MULTIPLIER,
            alpha_base: DEFAULT_ALPHA_BASE,
        }
    }

    /// A lake without any corner, returned when the seed cannot hold water.
    pub(crate) fn empty(id: LakeId, level: f32, origin: IVec2, search_bounds: CornerRect) -> Self {
        Self::new(
            id,
            level,
            origin,
            search_bounds,
            CornerRect::from_point(origin),
            vec![false],
        )
    }

    #[inline]
    pub fn has_corner(&self, x: i32, y: i32) -> bool {
        self.bounds
            .index_of(IVec2::new(x, y))
            .is_some_and(|index| self.corner_mask[index])
    }

    /// Returns true if any corner of the inclusive rectangle `min..=max`
    /// belongs to the lake.
    pub fn has_any_corner(&self, min: IVec2, max: IVec2) -> bool {
        CornerRect::new(min, max)
            .intersection(&self.bounds)
            .is_some_and(|rect| rect.corners().any(|pos| self.has_corner(pos.x, pos.y)))
    }

    pub fn corner_count(&self) -> usize {
        self.corner_count
    }

    pub fn is_empty(&self) -> bool {
        self.corner_count == 0
    }

    /// Iterates over the lake corners in row-major order.
    pub fn corners(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.bounds
            .corners()
            .zip(self.corner_mask.iter())
            .filter_map(|(pos, &valid)| valid.then_some(pos))
    }

    /// Water depth above the given ground height, never negative.
    #[inline]
    pub fn depth_at(&self, ground_height: f32) -> f32 {
        (self.level - ground_height).max(0.0)
    }

    /// Surface opacity above the given ground height.
    #[inline]
    pub fn alpha_at(&self, ground_height: f32) -> f32 {
        ((self.level - ground_height) * self.alpha_multiplier + self.alpha_base).clamp(0.0, 1.0)
    }

    /// Base texture transform, without the time dependent scroll.
    pub fn texture_matrix(&self) -> Mat4 {
        Mat4::from_rotation_z(self.texture_rotation.to_radians())
    }

    /// World space box around the water surface.
    pub fn world_aabb(&self) -> (Vec3, Vec3) {
        let min = corner_to_world(
            self.bounds.min.x as f32,
            self.bounds.min.y as f32,
            self.level,
        );
        let max = corner_to_world(
            self.bounds.max.x as f32,
            self.bounds.max.y as f32,
            self.level,
        );
        (min, max)
    }

    pub fn record(&self) -> LakeRecord {
        LakeRecord {
            min_x: self.search_bounds.min.x,
            min_y: self.search_bounds.min.y,
            max_x: self.search_bounds.max.x,
            max_y: self.search_bounds.max.y,
            origin_x: self.origin.x,
            origin_y: self.origin.y,
            level: self.level,
        }
    }
}
