use bevy::prelude::*;

/// Edge length of a lake chunk, in corners.
pub const CHUNK_SIZE: i32 = 10;
/// Largest corner grid a single lake may cover before it is refused.
pub const MAX_LAKE_CORNERS: usize = 4_194_304;
/// World distance between two neighbouring height map corners.
pub const CORNER_SPACING: f32 = 1.0;
/// Chunks need at least one full quad worth of corners to be kept.
pub const MIN_CHUNK_CORNERS: usize = 4;

pub const DEFAULT_WAVE_VECTOR: Vec2 = Vec2::new(0.866, 0.5);
pub const DEFAULT_TEXTURE_ROTATION_DEGREES: f32 = 30.0;
pub const DEFAULT_ALPHA_MULTIPLIER: f32 = 0.8;
pub const DEFAULT_ALPHA_BASE: f32 = 0.0;

pub const WATER_SAVE_FILE_NAME: &str = "water.ron";
pub const HEIGHT_MAP_FILE_NAME: &str = "heightmap.ron";
