//! Level of detail for water chunks.
//!
//! Detail is the corner stride used when building chunk geometry:
//! - 1: every height map corner becomes a vertex
//! - 2..=4: every n-th corner, so a quad spans n×n map cells

use crate::constants::{LOD_DISTANCE_STEP, LOD_FULL_DETAIL_DISTANCE, MAX_WATER_DETAIL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaterDetail(u32);

impl Default for WaterDetail {
    fn default() -> Self {
        Self::FULL
    }
}

impl WaterDetail {
    pub const FULL: WaterDetail = WaterDetail(1);

    /// Clamps `stride` into the supported range.
    pub fn new(stride: u32) -> Self {
        Self(stride.clamp(1, MAX_WATER_DETAIL))
    }

    #[inline]
    /// Corners skipped between two lattice vertices, plus one.
    pub fn stride(&self) -> i32 {
        self.0 as i32
    }

    /// Detail for a chunk `distance` world units in front of the camera.
    ///
    /// Full detail up to `LOD_FULL_DETAIL_DISTANCE`, then one step coarser
    /// every `LOD_DISTANCE_STEP` units.
    pub fn from_distance(distance: f32) -> Self {
        if distance <= LOD_FULL_DETAIL_DISTANCE {
            return Self::FULL;
        }
        let steps = ((distance - LOD_FULL_DETAIL_DISTANCE) / LOD_DISTANCE_STEP) as u32;
        Self::new(steps + 1)
    }
}
