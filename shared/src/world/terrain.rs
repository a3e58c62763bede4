//! Ground heights sampled at height map corners.

use std::{fs, path::Path};

use bevy::math::{IVec2, Vec3};
use bevy_ecs::resource::Resource;
use bevy_log::info;
use serde::{Deserialize, Serialize};

use super::CornerRect;
use crate::{water::WaterError, CORNER_SPACING};

/// Read access to the terrain a lake is delineated on.
pub trait Terrain {
    /// Height of the ground at a corner. Corners outside the map report 0.
    fn ground_height_at_corner(&self, x: i32, y: i32) -> f32;

    fn width_corners(&self) -> i32;

    fn height_corners(&self) -> i32;

    fn is_valid_corner(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width_corners() && y < self.height_corners()
    }

    /// All corners of the map.
    fn corner_rect(&self) -> CornerRect {
        CornerRect::new(
            IVec2::ZERO,
            IVec2::new(self.width_corners() - 1, self.height_corners() - 1),
        )
    }
}

/// Maps a grid corner and a height to a world position (y is up).
#[inline]
pub fn corner_to_world(x: f32, y: f32, height: f32) -> Vec3 {
    Vec3::new(x * CORNER_SPACING, height, y * CORNER_SPACING)
}

/// Dense row-major grid of corner heights.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMap {
    width: i32,
    height: i32,
    heights: Vec<f32>,
}

impl HeightMap {
    pub fn flat(width: i32, height: i32, ground: f32) -> Self {
        Self::from_fn(width, height, |_, _| ground)
    }

    pub fn from_fn(width: i32, height: i32, f: impl Fn(i32, i32) -> f32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let mut heights = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                heights.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            heights,
        }
    }

    /// Builds a height map from raw samples, checking the sample count.
    pub fn from_heights(width: i32, height: i32, heights: Vec<f32>) -> Result<Self, WaterError> {
        let map = Self {
            width,
            height,
            heights,
        };
        map.validate()?;
        Ok(map)
    }

    fn validate(&self) -> Result<(), WaterError> {
        let expected = self.width.max(0) as usize * self.height.max(0) as usize;
        if self.heights.len() != expected {
            return Err(WaterError::HeightMapSize {
                expected,
                actual: self.heights.len(),
            });
        }
        Ok(())
    }

    pub fn set_height(&mut self, x: i32, y: i32, ground: f32) {
        if let Some(index) = self.index(x, y) {
            self.heights[index] = ground;
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.is_valid_corner(x, y) {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    pub fn load(path: &Path) -> Result<Self, WaterError> {
        let contents = fs::read_to_string(path)?;
        let map: HeightMap =
            ron::from_str(&contents).map_err(|e| WaterError::Parse(e.to_string()))?;
        map.validate()?;
        info!(
            "Loaded {}x{} height map from {}",
            map.width,
            map.height,
            path.display()
        );
        Ok(map)
    }
}

impl Terrain for HeightMap {
    fn ground_height_at_corner(&self, x: i32, y: i32) -> f32 {
        self.index(x, y).map_or(0.0, |index| self.heights[index])
    }

    fn width_corners(&self) -> i32 {
        self.width
    }

    fn height_corners(&self) -> i32 {
        self.height
    }
}
