//! Draws water through Bevy meshes and materials.
//!
//! Every (chunk, pass) pair that was drawn at least once owns an entity.
//! Geometry is uploaded again only when the batch version changes, and
//! entities that were not drawn during a frame are hidden.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use bevy::{
    math::Affine2,
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        renderer::RenderDevice,
    },
};

use super::{
    backend::{
        BackendCapabilities, BackendError, BlendMode, DrawKey, PassState, QuadBatch, ShaderHandle,
        TextureHandle, TextureRole, WaterBackend,
    },
    material::{PassExtension, PassMaterial, WaterMaterial, WaterMaterialExtension, WaterMaterialUniform},
};
use crate::constants::{MAX_ANIMATED_BUMP_FRAMES, REFLECTION_SHARPNESS, SCENE_AMBIENT_LIGHT};

/// Triangle geometry ready for GPU upload.
#[derive(Debug, Default, Clone)]
pub struct WaterMeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// World x and z, scaled by the texture transform of the material.
    pub uvs: Vec<[f32; 2]>,
    /// White, with the vertex alpha.
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl WaterMeshData {
    /// Splits every quad `a b c d` into the triangles `a b c` and `a c d`.
    pub fn from_batch(batch: &QuadBatch<'_>) -> Self {
        let positions: Vec<[f32; 3]> = batch.positions.iter().map(|p| p.to_array()).collect();
        let uvs = batch.positions.iter().map(|p| [p.x, p.z]).collect();
        let colors = (0..batch.positions.len())
            .map(|i| {
                let alpha = batch
                    .alphas
                    .and_then(|alphas| alphas.get(i).copied())
                    .unwrap_or(batch.alpha);
                [1.0, 1.0, 1.0, alpha]
            })
            .collect();
        let indices = batch
            .indices
            .chunks_exact(4)
            .flat_map(|quad| [quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]])
            .collect();

        Self {
            normals: vec![[0.0, 1.0, 0.0]; positions.len()],
            positions,
            uvs,
            colors,
            indices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn into_mesh(self) -> Option<Mesh> {
        if self.is_empty() {
            return None;
        }

        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));

        // Needed by the bump map.
        if let Err(e) = mesh.generate_tangents() {
            warn!("Failed to generate tangents for water mesh: {:?}", e);
        }

        Some(mesh)
    }
}

/// One pass of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSlot {
    pub key: DrawKey,
    pub pass: &'static str,
}

/// Marks the entity drawing one pass of one chunk.
#[derive(Component, Debug)]
pub struct WaterSurface(pub SurfaceSlot);

#[derive(Debug, Clone)]
enum SurfaceMaterial {
    Pass(Handle<PassMaterial>),
    Shaded(Handle<WaterMaterial>),
}

#[derive(Debug)]
struct Surface {
    version: Option<u64>,
    pending_mesh: Option<Mesh>,
    pass: PassState,
    drawn: bool,
    visible: bool,
    entity: Option<Entity>,
    mesh: Option<Handle<Mesh>>,
    material: Option<SurfaceMaterial>,
}

/// Capabilities of the wgpu device. Everything besides the texture count is
/// always available.
pub fn device_capabilities(device: Option<&RenderDevice>) -> BackendCapabilities {
    match device {
        Some(device) => {
            BackendCapabilities::full(device.limits().max_sampled_textures_per_shader_stage)
        }
        None => BackendCapabilities {
            texture_units: 1,
            ..default()
        },
    }
}

/// [`WaterBackend`] on top of Bevy meshes and materials.
///
/// Draw calls are only recorded; [`sync_water_surfaces`] turns them into
/// entities once the frame's rendering is done.
#[derive(Resource)]
pub struct MeshBackend {
    asset_server: AssetServer,
    asset_root: PathBuf,
    capabilities: BackendCapabilities,
    textures: Vec<Handle<Image>>,
    shaders: HashMap<ShaderHandle, Handle<Shader>>,
    next_shader: u32,
    surfaces: HashMap<SurfaceSlot, Surface>,
}

impl MeshBackend {
    /// `asset_root` must be the folder the asset server reads from.
    pub fn new(
        asset_server: AssetServer,
        asset_root: PathBuf,
        capabilities: BackendCapabilities,
    ) -> Self {
        Self {
            asset_server,
            asset_root,
            capabilities,
            textures: Vec::new(),
            shaders: HashMap::new(),
            next_shader: 0,
            surfaces: HashMap::new(),
        }
    }

    /// Forgets which surfaces were drawn. Call once before rendering a frame.
    pub fn begin_frame(&mut self) {
        for surface in self.surfaces.values_mut() {
            surface.drawn = false;
        }
    }

    fn existing_path(&self, path: &str) -> Option<PathBuf> {
        let full_path = self.asset_root.join(path);
        full_path.exists().then_some(full_path)
    }

    fn load_image(&mut self, full_path: &Path) -> TextureHandle {
        let handle: Handle<Image> = self
            .asset_server
            .load(full_path.to_string_lossy().into_owned());
        self.textures.push(handle);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn image(&self, texture: TextureHandle) -> Option<Handle<Image>> {
        self.textures.get(texture.0 as usize).cloned()
    }

    fn layer_image(&self, pass: &PassState, role: TextureRole) -> Option<Handle<Image>> {
        pass.layer(role).and_then(|layer| self.image(layer.texture))
    }

    fn standard_material(&self, pass: &PassState) -> StandardMaterial {
        let mut material = standard_material(pass);
        material.base_color_texture = self.layer_image(pass, TextureRole::Base);
        material.normal_map_texture = self.layer_image(pass, TextureRole::Bump);
        material
    }

    fn pass_material(&self, pass: &PassState) -> PassMaterial {
        PassMaterial {
            base: self.standard_material(pass),
            extension: PassExtension {
                depth_write: pass.depth_write,
            },
        }
    }

    fn water_material(&self, pass: &PassState) -> WaterMaterial {
        WaterMaterial {
            base: self.standard_material(pass),
            extension: WaterMaterialExtension {
                uniform: WaterMaterialUniform {
                    wave_vector: pass.wave_vector,
                    time: pass.time,
                    reflection_strength: pass.reflection_strength,
                    reflection_sharpness: REFLECTION_SHARPNESS,
                    ..default()
                },
                bump: self.layer_image(pass, TextureRole::Bump),
                environment: self.layer_image(pass, TextureRole::Environment),
                depth_write: pass.depth_write,
            },
        }
    }
}

fn alpha_mode(blend: BlendMode) -> AlphaMode {
    match blend {
        BlendMode::Opaque => AlphaMode::Opaque,
        BlendMode::Alpha => AlphaMode::Blend,
        BlendMode::Additive => AlphaMode::Add,
    }
}

/// Texture transform of the first layer, reduced to the horizontal plane.
fn uv_transform(pass: &PassState) -> Affine2 {
    pass.layers.first().map_or(Affine2::IDENTITY, |layer| {
        let m = layer.matrix;
        Affine2::from_mat2_translation(
            Mat2::from_cols(m.x_axis.truncate().truncate(), m.y_axis.truncate().truncate()),
            m.w_axis.truncate().truncate(),
        )
    })
}

/// Fixed function pass state expressed as a PBR material, without textures.
///
/// Diffuse scales the base color, the ambient term becomes emission under
/// [`SCENE_AMBIENT_LIGHT`] and specular scales the reflectance. Depth writes
/// are carried by the material extension.
fn standard_material(pass: &PassState) -> StandardMaterial {
    let color = pass.color;
    let (unlit, perceptual_roughness) = match pass.lighting {
        // Blinn-Phong exponent to roughness.
        Some(lighting) => (false, (2.0 / (lighting.shininess + 2.0)).sqrt()),
        None => (true, 1.0),
    };
    let diffuse = pass.lighting.map_or(1.0, |lighting| lighting.diffuse);
    let ambient = pass
        .lighting
        .map_or(0.0, |lighting| lighting.ambient * SCENE_AMBIENT_LIGHT);
    let specular = pass.lighting.map_or(0.0, |lighting| lighting.specular);

    StandardMaterial {
        base_color: Color::srgba(color.x * diffuse, color.y * diffuse, color.z * diffuse, color.w),
        emissive: LinearRgba::rgb(color.x * ambient, color.y * ambient, color.z * ambient),
        alpha_mode: alpha_mode(pass.blend),
        unlit,
        perceptual_roughness,
        reflectance: (0.5 * specular + pass.reflection_strength).min(1.0),
        uv_transform: uv_transform(pass),
        cull_mode: None,
        double_sided: true,
        ..default()
    }
}

impl WaterBackend for MeshBackend {
    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BackendError> {
        let full_path = self
            .existing_path(path)
            .ok_or_else(|| BackendError::TextureUnavailable(path.to_string()))?;
        Ok(self.load_image(&full_path))
    }

    fn load_environment_map(&mut self, path: &str) -> Result<TextureHandle, BackendError> {
        self.load_texture(path)
    }

    fn load_animated_texture(&mut self, prefix: &str) -> Result<Vec<TextureHandle>, BackendError> {
        let mut frames = Vec::new();
        for frame in 0..MAX_ANIMATED_BUMP_FRAMES {
            let Some(full_path) = self.existing_path(&format!("{}-{}.png", prefix, frame)) else {
                break;
            };
            frames.push(self.load_image(&full_path));
        }
        if frames.is_empty() {
            return Err(BackendError::TextureUnavailable(format!("{}-0.png", prefix)));
        }
        log::debug!("Loaded {} frames of {}", frames.len(), prefix);
        Ok(frames)
    }

    fn load_shader(&mut self, path: &str) -> Result<ShaderHandle, BackendError> {
        if self.existing_path(path).is_none() {
            return Err(BackendError::ShaderUnavailable {
                path: path.to_string(),
                reason: "file not found".to_string(),
            });
        }
        // Same path as the material extension, so both share the asset.
        let shader: Handle<Shader> = self.asset_server.load(path.to_string());
        let handle = ShaderHandle(self.next_shader);
        self.next_shader += 1;
        self.shaders.insert(handle, shader);
        Ok(handle)
    }

    fn release_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
    }

    fn draw_quads(&mut self, batch: &QuadBatch<'_>, pass: &PassState) -> Result<(), BackendError> {
        let vertex_count = batch.positions.len() as u32;
        if batch.indices.len() % 4 != 0 || batch.indices.iter().any(|&i| i >= vertex_count) {
            return Err(BackendError::DrawRejected {
                quads: batch.quad_count(),
                reason: "indices do not form quads over the vertices".to_string(),
            });
        }
        if let Some(alphas) = batch.alphas {
            if alphas.len() != batch.positions.len() {
                return Err(BackendError::DrawRejected {
                    quads: batch.quad_count(),
                    reason: format!(
                        "{} alphas for {} vertices",
                        alphas.len(),
                        batch.positions.len()
                    ),
                });
            }
        }

        let slot = SurfaceSlot {
            key: batch.key,
            pass: pass.name,
        };
        let surface = self.surfaces.entry(slot).or_insert_with(|| Surface {
            version: None,
            pending_mesh: None,
            pass: pass.clone(),
            drawn: false,
            visible: false,
            entity: None,
            mesh: None,
            material: None,
        });
        if surface.version != Some(batch.version) {
            surface.pending_mesh = WaterMeshData::from_batch(batch).into_mesh();
            surface.version = Some(batch.version);
        }
        surface.pass = pass.clone();
        surface.drawn = true;
        Ok(())
    }
}

/// Uploads pending geometry and materials, spawns new surfaces and hides the
/// ones that were not drawn this frame.
pub fn sync_water_surfaces(
    mut commands: Commands,
    mut backend: ResMut<MeshBackend>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut pass_materials: ResMut<Assets<PassMaterial>>,
    mut water_materials: ResMut<Assets<WaterMaterial>>,
) {
    let backend = &mut *backend;
    let mut surfaces = std::mem::take(&mut backend.surfaces);

    for (slot, surface) in surfaces.iter_mut() {
        if let Some(mesh) = surface.pending_mesh.take() {
            match &surface.mesh {
                Some(handle) => {
                    meshes.insert(handle.id(), mesh);
                }
                None => surface.mesh = Some(meshes.add(mesh)),
            }
        }
        let Some(mesh) = surface.mesh.clone() else {
            continue;
        };

        if surface.drawn {
            let shaded = surface.pass.shader.is_some();
            match (&surface.material, shaded) {
                (Some(SurfaceMaterial::Pass(handle)), false) => {
                    if let Some(material) = pass_materials.get_mut(handle) {
                        *material = backend.pass_material(&surface.pass);
                    }
                }
                (Some(SurfaceMaterial::Shaded(handle)), true) => {
                    if let Some(material) = water_materials.get_mut(handle) {
                        *material = backend.water_material(&surface.pass);
                    }
                }
                _ => {
                    let material = if shaded {
                        SurfaceMaterial::Shaded(
                            water_materials.add(backend.water_material(&surface.pass)),
                        )
                    } else {
                        SurfaceMaterial::Pass(pass_materials.add(backend.pass_material(&surface.pass)))
                    };
                    if let Some(entity) = surface.entity.take() {
                        commands.entity(entity).despawn();
                    }
                    surface.material = Some(material);
                }
            }
        }

        let visibility = if surface.drawn {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        match surface.entity {
            Some(entity) => {
                commands.entity(entity).insert(Mesh3d(mesh));
                if surface.visible != surface.drawn {
                    commands.entity(entity).insert(visibility);
                }
            }
            None => {
                let mut entity = commands.spawn((
                    Mesh3d(mesh),
                    Transform::IDENTITY,
                    visibility,
                    WaterSurface(*slot),
                ));
                match &surface.material {
                    Some(SurfaceMaterial::Pass(handle)) => {
                        entity.insert(MeshMaterial3d(handle.clone()));
                    }
                    Some(SurfaceMaterial::Shaded(handle)) => {
                        entity.insert(MeshMaterial3d(handle.clone()));
                    }
                    None => {}
                }
                surface.entity = Some(entity.id());
            }
        }
        surface.visible = surface.drawn;
    }

    backend.surfaces = surfaces;
}
