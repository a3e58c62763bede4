use std::fmt;

use bevy::math::IVec2;
use serde::{Deserialize, Serialize};

use crate::world::Terrain;

/// Identifies a lake within one loaded map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LakeId(pub u32);

impl fmt::Display for LakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which lake, if any, has claimed each corner of the map.
///
/// Claims only ever go from `None` to `Some` while lakes are being found, so
/// the first lake to reach a corner keeps it. A lake that is refused gives
/// its corners back through [`CornerOwnership::release`].
#[derive(Debug, Clone, Default)]
pub struct CornerOwnership {
    width: i32,
    height: i32,
    owners: Vec<Option<LakeId>>,
}

impl CornerOwnership {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            owners: vec![None; (width * height) as usize],
        }
    }

    pub fn for_terrain<T: Terrain + ?Sized>(terrain: &T) -> Self {
        Self::new(terrain.width_corners(), terrain.height_corners())
    }

    #[inline]
    fn index(&self, pos: IVec2) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    #[inline]
    pub fn owner(&self, pos: IVec2) -> Option<LakeId> {
        self.index(pos).and_then(|index| self.owners[index])
    }

    #[inline]
    pub fn is_claimed(&self, pos: IVec2) -> bool {
        self.owner(pos).is_some()
    }

    /// Claims a corner for `lake`. Returns false if the corner is outside the
    /// map or already owned.
    pub fn claim(&mut self, pos: IVec2, lake: LakeId) -> bool {
        match self.index(pos) {
            Some(index) if self.owners[index].is_none() => {
                self.owners[index] = Some(lake);
                true
            }
            _ => false,
        }
    }

    pub fn claimed_count(&self) -> usize {
        self.owners.iter().filter(|owner| owner.is_some()).count()
    }

    /// Gives back every corner claimed by `lake`. Returns how many were freed.
    pub fn release(&mut self, lake: LakeId) -> usize {
        let mut released = 0;
        for owner in self.owners.iter_mut().filter(|owner| **owner == Some(lake)) {
            *owner = None;
            released += 1;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let mut ownership = CornerOwnership::new(3, 3);
        let pos = IVec2::new(1, 2);
        assert!(ownership.claim(pos, LakeId(1)));
        assert!(!ownership.claim(pos, LakeId(2)));
        assert_eq!(ownership.owner(pos), Some(LakeId(1)));
        assert_eq!(ownership.claimed_count(), 1);

        assert_eq!(ownership.release(LakeId(2)), 0);
        assert!(ownership.is_claimed(pos));
    }

    #[test]
    fn test_release_only_frees_that_lake() {
        let mut ownership = CornerOwnership::new(4, 4);
        ownership.claim(IVec2::new(0, 0), LakeId(0));
        ownership.claim(IVec2::new(1, 0), LakeId(1));
        ownership.claim(IVec2::new(2, 0), LakeId(1));

        assert_eq!(ownership.release(LakeId(1)), 2);
        assert_eq!(ownership.owner(IVec2::new(0, 0)), Some(LakeId(0)));
        assert!(!ownership.is_claimed(IVec2::new(1, 0)));
        assert!(ownership.claim(IVec2::new(2, 0), LakeId(2)));
    }

    #[test]
    fn test_out_of_map_corners_cannot_be_claimed() {
        let mut ownership = CornerOwnership::new(2, 2);
        assert!(!ownership.claim(IVec2::new(2, 0), LakeId(0)));
        assert!(!ownership.claim(IVec2::new(0, -1), LakeId(0)));
        assert_eq!(ownership.owner(IVec2::new(5, 5)), None);
    }
}
