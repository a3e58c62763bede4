//! Water rendering.
//!
//! [`WaterManager`] decides what to draw and how; [`MeshBackend`] turns the
//! resulting quad batches into Bevy meshes. Everything in between only talks
//! to the [`backend::WaterBackend`] trait.

pub mod backend;
pub mod chunk_cache;
pub mod detail;
pub mod frustum;
pub mod manager;
pub mod material;
pub mod mesh_backend;
pub mod settings;
pub mod technique;

use bevy::{
    prelude::*,
    render::{camera::CameraProjection, renderer::RenderDevice},
    transform::TransformSystem,
};
use shared::{
    water::WaterMap,
    world::{ExploredMap, FogOfWar, HeightMap, NoFog},
    GameFolderPaths,
};

pub use frustum::Frustum;
pub use manager::{RenderStatistics, WaterManager};
pub use material::{PassMaterial, WaterMaterial};
pub use mesh_backend::{device_capabilities, sync_water_surfaces, MeshBackend, WaterSurface};
pub use settings::{load_water_settings, write_water_settings_to_path, WaterSettings};

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaterSet {
    /// Clock and invalidation.
    Prepare,
    Render,
    /// Hands the frame's draws over to the ECS.
    Sync,
}

/// Renders the [`WaterMap`] resource under the 3D camera.
pub struct WaterPlugin;

impl Plugin for WaterPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            MaterialPlugin::<PassMaterial>::default(),
            MaterialPlugin::<WaterMaterial>::default(),
        ))
        .init_resource::<WaterManager>()
        .configure_sets(
            Update,
            WaterSet::Prepare.run_if(resource_exists::<MeshBackend>),
        )
        .configure_sets(
            PostUpdate,
            (WaterSet::Render, WaterSet::Sync)
                .chain()
                .after(TransformSystem::TransformPropagate)
                .run_if(resource_exists::<MeshBackend>),
        )
        .add_systems(Startup, setup_water_backend)
        .add_systems(
            Update,
            (
                advance_water_clock,
                apply_water_settings,
                track_exploration,
                track_water_map,
            )
                .in_set(WaterSet::Prepare),
        )
        .add_systems(PostUpdate, render_water.in_set(WaterSet::Render))
        .add_systems(PostUpdate, sync_water_surfaces.in_set(WaterSet::Sync));
    }
}

fn setup_water_backend(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    render_device: Option<Res<RenderDevice>>,
    paths: Res<GameFolderPaths>,
    settings: Res<WaterSettings>,
    mut manager: ResMut<WaterManager>,
) {
    let capabilities = device_capabilities(render_device.as_deref());
    info!("Water backend capabilities: {:?}", capabilities);

    let mut backend = MeshBackend::new(
        asset_server.clone(),
        paths.assets_folder_path.clone(),
        capabilities,
    );
    manager.initialize(&settings, &mut backend);
    commands.insert_resource(backend);
}

fn advance_water_clock(time: Res<Time>, mut manager: ResMut<WaterManager>) {
    manager.update(time.delta_secs());
}

fn apply_water_settings(
    settings: Res<WaterSettings>,
    mut manager: ResMut<WaterManager>,
    mut backend: ResMut<MeshBackend>,
) {
    if settings.is_changed() && !settings.is_added() {
        manager.reload_configuration(&settings, &mut *backend);
    }
}

fn track_exploration(explored: Option<Res<ExploredMap>>, mut manager: ResMut<WaterManager>) {
    if explored.is_some_and(|explored| explored.is_changed()) {
        manager.fog_changed();
    }
}

fn track_water_map(water: Res<WaterMap>, mut manager: ResMut<WaterManager>) {
    if water.is_changed() {
        manager.water_changed();
    }
}

fn render_water(
    water: Res<WaterMap>,
    terrain: Res<HeightMap>,
    explored: Option<Res<ExploredMap>>,
    camera: Query<(&GlobalTransform, &Projection), With<Camera3d>>,
    mut manager: ResMut<WaterManager>,
    mut backend: ResMut<MeshBackend>,
) {
    let Ok((transform, projection)) = camera.single() else {
        return;
    };
    let frustum = Frustum::from_camera(transform, projection.get_clip_from_view());
    let fog: &dyn FogOfWar = match &explored {
        Some(explored) => &**explored,
        None => &NoFog,
    };

    backend.begin_frame();
    manager.render(&water, &*terrain, fog, &frustum, &mut *backend);
}
