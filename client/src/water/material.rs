//! Materials the Bevy backend draws water passes with.
//!
//! Both wrap [`StandardMaterial`] so lighting, fog and tonemapping match the
//! rest of the scene. [`PassMaterial`] keeps the standard shaders and only
//! changes pipeline state; [`WaterMaterial`] adds the water fragment shader.

use bevy::{
    asset::Asset,
    pbr::{
        ExtendedMaterial, MaterialExtension, MaterialExtensionKey, MaterialExtensionPipeline,
        StandardMaterial,
    },
    prelude::*,
    render::{
        mesh::MeshVertexBufferLayoutRef,
        render_resource::{
            AsBindGroup, DepthStencilState, RenderPipelineDescriptor, ShaderRef, ShaderType,
            SpecializedMeshPipelineError,
        },
    },
};

use crate::constants::{REFLECTION_SHARPNESS, TEXTURE_REPEAT, TEXTURE_SCROLL_SPEED, WATER_SHADER};

/// Pipeline state that varies between passes of the same technique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PassKey {
    pub depth_write: bool,
}

/// Overrides the depth write flag Bevy picks from the alpha mode.
fn apply_pass_key(depth_stencil: Option<&mut DepthStencilState>, key: PassKey) {
    if let Some(depth_stencil) = depth_stencil {
        depth_stencil.depth_write_enabled = key.depth_write;
    }
}

/// Fixed function pass on top of the standard PBR shaders.
#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
#[bind_group_data(PassKey)]
pub struct PassExtension {
    pub depth_write: bool,
}

impl From<&PassExtension> for PassKey {
    fn from(extension: &PassExtension) -> Self {
        Self {
            depth_write: extension.depth_write,
        }
    }
}

impl MaterialExtension for PassExtension {
    fn specialize(
        _pipeline: &MaterialExtensionPipeline,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        key: MaterialExtensionKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        apply_pass_key(descriptor.depth_stencil.as_mut(), key.bind_group_data);
        Ok(())
    }
}

pub type PassMaterial = ExtendedMaterial<StandardMaterial, PassExtension>;

/// Per-lake values of `data/shaders/water.wgsl`.
#[derive(Clone, Copy, Debug, ShaderType)]
pub struct WaterMaterialUniform {
    pub wave_vector: Vec2,
    /// Animation clock, in seconds.
    pub time: f32,
    pub scroll_speed: f32,
    pub texture_repeat: f32,
    pub reflection_strength: f32,
    pub reflection_sharpness: f32,
}

impl Default for WaterMaterialUniform {
    fn default() -> Self {
        Self {
            wave_vector: Vec2::X,
            time: 0.0,
            scroll_speed: TEXTURE_SCROLL_SPEED,
            texture_repeat: TEXTURE_REPEAT,
            reflection_strength: 0.0,
            reflection_sharpness: REFLECTION_SHARPNESS,
        }
    }
}

#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
#[bind_group_data(PassKey)]
pub struct WaterMaterialExtension {
    #[uniform(100)]
    pub uniform: WaterMaterialUniform,
    #[texture(101)]
    #[sampler(102)]
    pub bump: Option<Handle<Image>>,
    /// Equirectangular sky panorama.
    #[texture(103)]
    #[sampler(104)]
    pub environment: Option<Handle<Image>>,
    pub depth_write: bool,
}

impl From<&WaterMaterialExtension> for PassKey {
    fn from(extension: &WaterMaterialExtension) -> Self {
        Self {
            depth_write: extension.depth_write,
        }
    }
}

impl MaterialExtension for WaterMaterialExtension {
    fn fragment_shader() -> ShaderRef {
        WATER_SHADER.into()
    }

    fn specialize(
        _pipeline: &MaterialExtensionPipeline,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        key: MaterialExtensionKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        apply_pass_key(descriptor.depth_stencil.as_mut(), key.bind_group_data);
        Ok(())
    }
}

pub type WaterMaterial = ExtendedMaterial<StandardMaterial, WaterMaterialExtension>;

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::render_resource::{CompareFunction, TextureFormat};

    fn depth_stencil(depth_write_enabled: bool) -> DepthStencilState {
        DepthStencilState {
            format: TextureFormat::Depth32Float,
            depth_write_enabled,
            depth_compare: CompareFunction::GreaterEqual,
            stencil: default(),
            bias: default(),
        }
    }

    #[test]
    fn test_pass_key_controls_depth_writes() {
        let mut state = depth_stencil(true);
        apply_pass_key(Some(&mut state), PassKey::from(&PassExtension { depth_write: false }));
        assert!(!state.depth_write_enabled);

        // Translucent passes that ask for depth writes get them back.
        let mut state = depth_stencil(false);
        apply_pass_key(Some(&mut state), PassKey { depth_write: true });
        assert!(state.depth_write_enabled);

        apply_pass_key(None, PassKey { depth_write: false });
    }
}
