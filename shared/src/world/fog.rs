//! Fog of war as seen by the water renderer.

use bevy_ecs::resource::Resource;

/// Answers whether a map cell is hidden from the local player.
pub trait FogOfWar {
    fn is_cell_fogged(&self, x: i32, y: i32) -> bool;
}

/// Everything is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFog;

impl FogOfWar for NoFog {
    fn is_cell_fogged(&self, _x: i32, _y: i32) -> bool {
        false
    }
}

/// Per-cell exploration state. Unexplored and out-of-map cells are fogged.
#[derive(Resource, Debug, Clone)]
pub struct ExploredMap {
    width: i32,
    height: i32,
    explored: Vec<bool>,
}

impl ExploredMap {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            explored: vec![false; (width * height) as usize],
        }
    }

    /// A map with every cell already explored.
    pub fn fully_explored(width: i32, height: i32) -> Self {
        let mut map = Self::new(width, height);
        map.explored.fill(true);
        map
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    pub fn explore(&mut self, x: i32, y: i32) {
        if let Some(index) = self.index(x, y) {
            self.explored[index] = true;
        }
    }

    pub fn unexplore(&mut self, x: i32, y: i32) {
        if let Some(index) = self.index(x, y) {
            self.explored[index] = false;
        }
    }

    pub fn is_explored(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|index| self.explored[index])
    }
}

impl FogOfWar for ExploredMap {
    fn is_cell_fogged(&self, x: i32, y: i32) -> bool {
        !self.is_explored(x, y)
    }
}
