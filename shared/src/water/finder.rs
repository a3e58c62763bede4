//! Flood fill that delineates a lake from a seed corner.

use bevy::math::IVec2;
use bevy_log::{debug, warn};

use super::{decompose_into_chunks, CornerOwnership, Lake, LakeId, WaterError};
use crate::{
    world::{CornerRect, Terrain},
    MAX_LAKE_CORNERS,
};

const NEIGHBOR_OFFSETS: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Delineates lakes on a terrain, recording every visited corner in the
/// shared ownership map.
pub struct LakeFinder<'a, T: Terrain + ?Sized> {
    terrain: &'a T,
    ownership: &'a mut CornerOwnership,
}

impl<'a, T: Terrain + ?Sized> LakeFinder<'a, T> {
    pub fn new(terrain: &'a T, ownership: &'a mut CornerOwnership) -> Self {
        Self { terrain, ownership }
    }

    /// Collects every corner reachable from `seed` through 8-connected
    /// neighbours whose ground lies strictly below `level`, without leaving
    /// `search_bounds`.
    ///
    /// The returned lake may be empty; callers must check
    /// [`Lake::is_empty`] before keeping it.
    pub fn find_water(
        &mut self,
        id: LakeId,
        seed: IVec2,
        search_bounds: CornerRect,
        level: f32,
    ) -> Result<Lake, WaterError> {
        let Some(search) = search_bounds.intersection(&self.terrain.corner_rect()) else {
            warn!(
                "Search bounds {:?} of lake {} do not overlap the map",
                search_bounds, id
            );
            return Ok(Lake::empty(id, level, seed, search_bounds));
        };

        if !search.contains(seed) {
            warn!("Origin {} of lake {} lies outside its search bounds", seed, id);
            return Ok(Lake::empty(id, level, seed, search_bounds));
        }
        if self.terrain.ground_height_at_corner(seed.x, seed.y) >= level {
            warn!(
                "Origin {} of lake {} is not below water level {}",
                seed, id, level
            );
            return Ok(Lake::empty(id, level, seed, search_bounds));
        }

        let seed_is_ours = self.ownership.claim(seed, id);
        if !seed_is_ours {
            warn!(
                "Origin {} of lake {} is already under water (lake {:?})",
                seed,
                id,
                self.ownership.owner(seed)
            );
        }

        let mut found: Vec<IVec2> = Vec::new();
        let mut open = vec![seed];
        while let Some(corner) = open.pop() {
            if corner != seed || seed_is_ours {
                found.push(corner);
            }
            for offset in NEIGHBOR_OFFSETS {
                let neighbor = corner + offset;
                if !search.contains(neighbor) {
                    continue;
                }
                if self.terrain.ground_height_at_corner(neighbor.x, neighbor.y) >= level {
                    continue;
                }
                if self.ownership.claim(neighbor, id) {
                    open.push(neighbor);
                }
            }
        }

        let Some(first) = found.first() else {
            debug!("Lake {} found no free corner below level {}", id, level);
            return Ok(Lake::empty(id, level, seed, search_bounds));
        };
        let mut tight = CornerRect::from_point(*first);
        for corner in &found {
            tight.expand(*corner);
        }
        // Shore ring, never leaving the search area.
        let bounds = tight.grown(1).intersection(&search).unwrap_or(tight);

        let corners = bounds.corner_count();
        if corners > MAX_LAKE_CORNERS {
            return Err(WaterError::LakeTooLarge {
                corners,
                max: MAX_LAKE_CORNERS,
            });
        }

        let mut mask = vec![false; corners];
        for corner in &found {
            if let Some(index) = bounds.index_of(*corner) {
                mask[index] = true;
            }
        }

        let mut lake = Lake::new(id, level, seed, search_bounds, bounds, mask);
        lake.chunks = decompose_into_chunks(&lake, self.terrain);
        debug!(
            "Lake {}: {} corners in {:?}, {} chunks",
            id,
            lake.corner_count(),
            lake.bounds,
            lake.chunks.len()
        );
        Ok(lake)
    }
}
