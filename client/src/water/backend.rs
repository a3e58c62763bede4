//! The seam between the water renderer and whatever draws the quads.

use bevy::prelude::*;
use shared::water::LakeId;

/// What the graphics backend can do, as far as water is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCapabilities {
    pub texture_units: u32,
    pub cube_maps: bool,
    /// Texture combiners: interpolating between two texture stages.
    pub texture_combine: bool,
    /// Per-pixel dot product between a normal map and the light vector.
    pub dot3: bool,
    /// Blending against a constant color.
    pub blend_color: bool,
    pub shader_objects: bool,
}

impl BackendCapabilities {
    /// A backend that can do everything water knows how to use.
    pub fn full(texture_units: u32) -> Self {
        Self {
            texture_units,
            cube_maps: true,
            texture_combine: true,
            dot3: true,
            blend_color: true,
            shader_objects: true,
        }
    }

    /// Environment mapping needs a second texture stage and cube maps.
    pub fn supports_reflections(&self) -> bool {
        self.texture_units > 1 && self.cube_maps && self.texture_combine
    }

    /// N·L lighting from a normal map, combined in a second stage.
    pub fn supports_bumpmapping(&self) -> bool {
        self.texture_units > 1 && self.texture_combine && self.dot3 && self.blend_color
    }

    pub fn supports_translucency(&self) -> bool {
        self.texture_units > 1 && self.texture_combine
    }

    /// Base, bump and environment textures bound at once.
    pub fn supports_shaders(&self) -> bool {
        self.shader_objects && self.texture_units >= 3
    }
}

/// Texture owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Shader program owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// How a pass combines with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    Alpha,
    Additive,
}

/// What a bound texture is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Base,
    Bump,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureLayer {
    pub role: TextureRole,
    pub texture: TextureHandle,
    /// Maps world x/z (as s/t) to texture coordinates.
    pub matrix: Mat4,
}

/// Material response to scene lights, as fractions of the light color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLighting {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

/// Fixed function state a batch is drawn under.
#[derive(Debug, Clone, PartialEq)]
pub struct PassState {
    /// Stable per technique pass, so backends can key resources on it.
    pub name: &'static str,
    pub blend: BlendMode,
    pub depth_write: bool,
    /// Tint; alpha multiplies the per-vertex alpha.
    pub color: Vec4,
    pub lighting: Option<SurfaceLighting>,
    pub layers: Vec<TextureLayer>,
    pub shader: Option<ShaderHandle>,
    pub reflection_strength: f32,
    pub wave_vector: Vec2,
    pub time: f32,
}

impl PassState {
    pub fn layer(&self, role: TextureRole) -> Option<&TextureLayer> {
        self.layers.iter().find(|layer| layer.role == role)
    }
}

/// Identifies the geometry of one chunk across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawKey {
    pub lake: LakeId,
    pub chunk: usize,
}

/// Indexed quads: every four indices form one quad, counter-clockwise seen
/// from above.
#[derive(Debug, Clone, Copy)]
pub struct QuadBatch<'a> {
    pub key: DrawKey,
    /// Changes whenever the buffers below change.
    pub version: u64,
    pub positions: &'a [Vec3],
    pub alphas: Option<&'a [f32]>,
    pub indices: &'a [u32],
    /// Used for every vertex when `alphas` is `None`.
    pub alpha: f32,
}

impl QuadBatch<'_> {
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 4
    }
}

/// Failures the water renderer recovers from by disabling features.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("texture `{0}` is not available")]
    TextureUnavailable(String),
    #[error("shader `{path}` is not available: {reason}")]
    ShaderUnavailable { path: String, reason: String },
    #[error("draw of {quads} quads was rejected: {reason}")]
    DrawRejected { quads: usize, reason: String },
}

/// Everything the water renderer needs from the graphics backend.
///
/// Loads fail with a [`BackendError`] instead of panicking, so missing
/// assets only switch off the features that need them.
pub trait WaterBackend {
    fn capabilities(&self) -> BackendCapabilities;

    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BackendError>;

    /// Loads the sky reflected by the water surface.
    fn load_environment_map(&mut self, path: &str) -> Result<TextureHandle, BackendError>;

    /// Loads `<prefix>-0.png`, `<prefix>-1.png`, ... in order.
    fn load_animated_texture(&mut self, prefix: &str) -> Result<Vec<TextureHandle>, BackendError>;

    fn load_shader(&mut self, path: &str) -> Result<ShaderHandle, BackendError>;

    fn release_shader(&mut self, shader: ShaderHandle);

    fn draw_quads(&mut self, batch: &QuadBatch<'_>, pass: &PassState) -> Result<(), BackendError>;
}
