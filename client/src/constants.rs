/// Asset folder, relative to the Bevy asset base path, when none is given.
pub const DEFAULT_ASSETS_FOLDER: &str = "../data";
pub const WATER_SETTINGS_PATH: &str = "water.ron";

pub const WATER_TEXTURE: &str = "textures/water.jpg";
/// Equirectangular sky panorama.
pub const WATER_ENVIRONMENT_MAP: &str = "textures/sky.png";
pub const WATER_BUMP_TEXTURE: &str = "textures/water-bumpmap.png";
/// Frames are looked up as `<prefix>-<n>.png`, starting at 0.
pub const WATER_ANIMATED_BUMP_PREFIX: &str = "textures/water-animbumpmap";
pub const WATER_SHADER: &str = "shaders/water.wgsl";

pub const REFLECTION_STRENGTH: f32 = 0.25;
pub const REFLECTION_SHARPNESS: f32 = 1.5;
pub const WATER_AMBIENT: f32 = 0.8;
/// Scene ambient light the material ambient term is lit by.
pub const SCENE_AMBIENT_LIGHT: f32 = 0.2;
pub const WATER_DIFFUSE: f32 = 0.8;
pub const WATER_SPECULAR: f32 = 1.0;
pub const WATER_SHININESS: f32 = 32.0;
/// Texture repeats per height map corner.
pub const TEXTURE_REPEAT: f32 = 0.1;
/// Texture scroll, in texture units per second.
pub const TEXTURE_SCROLL_SPEED: f32 = 0.04;
pub const ANIMATED_BUMP_FPS: f32 = 15.0;
/// Offset added to the animation clock so water does not start in a
/// recognisable rest pose.
pub const WATER_TIME_OFFSET: f32 = 10.637_986;

pub const LOD_FULL_DETAIL_DISTANCE: f32 = 50.0;
pub const LOD_DISTANCE_STEP: f32 = 75.0;
pub const MAX_WATER_DETAIL: u32 = 4;

/// Most frames probed when loading an animated bump map.
pub const MAX_ANIMATED_BUMP_FRAMES: usize = 64;
