mod constants;
mod water;

use std::path::{Path, PathBuf};

use bevy::{
    asset::io::file::FileAssetReader,
    prelude::*,
    render::mesh::{Indices, PrimitiveTopology},
    window::PresentMode,
};
use clap::Parser;
use constants::{DEFAULT_ASSETS_FOLDER, WATER_SETTINGS_PATH};
use shared::{
    get_game_folder_paths,
    water::{load_lake_records, save_lake_records, WaterMap},
    world::{corner_to_world, CornerRect, ExploredMap, HeightMap, Terrain},
    GameFolderPaths,
};
use water::{load_water_settings, write_water_settings_to_path, WaterManager, WaterPlugin, WaterSettings};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    game_folder_path: Option<String>,

    #[arg(
        short,
        long,
        help = "Allows overriding of the asset folder path, defaults to <game_folder_path>/data"
    )]
    assets_folder_path: Option<String>,

    #[arg(short, long, default_value = "default", help = "Map to load from <game_folder_path>/maps")]
    map: String,

    #[arg(short, long, help = "Lake records to load instead of the map's water.ron")]
    lakes: Option<String>,

    #[arg(long, help = "Draw distant water with coarser geometry")]
    dynamic_lod: bool,
}

/// Where F8 writes the current lakes.
#[derive(Resource, Debug)]
struct LakeSavePath(PathBuf);

/// Asset folder as Bevy's file reader will resolve it, so files checked on disk
/// and files loaded through the asset server are the same.
fn resolve_assets_folder(base_path: &Path, assets_folder_path: Option<&str>) -> PathBuf {
    base_path.join(assets_folder_path.unwrap_or(DEFAULT_ASSETS_FOLDER))
}

/// Rolling hills around a basin, used when the map has no height map.
fn demo_height_map() -> HeightMap {
    HeightMap::from_fn(65, 65, |x, y| {
        let dx = (x - 32) as f32;
        let dy = (y - 32) as f32;
        let distance = (dx * dx + dy * dy).sqrt() / 32.0;
        distance * distance * 8.0 - 1.5 + (x as f32 * 0.3).sin() * (y as f32 * 0.25).cos() * 0.6
    })
}

fn load_terrain(paths: &GameFolderPaths, map: &str) -> HeightMap {
    let path = paths.height_map_path(map);
    match HeightMap::load(&path) {
        Ok(terrain) => terrain,
        Err(e) => {
            warn!("Using demo terrain, could not load {:?}: {}", path, e);
            demo_height_map()
        }
    }
}

fn load_water(terrain: &HeightMap, lakes_path: &Path) -> WaterMap {
    let mut water = WaterMap::new(terrain);
    match load_lake_records(lakes_path) {
        Ok(parsed) => {
            water.load_records(parsed, terrain);
        }
        Err(e) => {
            warn!("No lakes loaded from {:?}: {}, adding a demo lake", lakes_path, e);
            let center = IVec2::new(terrain.width_corners() / 2, terrain.height_corners() / 2);
            if let Err(e) = water.add_lake(center, terrain.corner_rect(), 1.0, terrain) {
                warn!("Demo lake rejected: {}", e);
            }
        }
    }
    water
}

fn terrain_mesh(terrain: &HeightMap) -> Mesh {
    let width = terrain.width_corners();
    let height = terrain.height_corners();
    let mut positions = Vec::with_capacity((width * height) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());
    for y in 0..height {
        for x in 0..width {
            let ground = terrain.ground_height_at_corner(x, y);
            positions.push(corner_to_world(x as f32, y as f32, ground).to_array());
            let slope_x = terrain.ground_height_at_corner(x + 1, y)
                - terrain.ground_height_at_corner(x - 1, y);
            let slope_y = terrain.ground_height_at_corner(x, y + 1)
                - terrain.ground_height_at_corner(x, y - 1);
            normals.push(Vec3::new(-slope_x, 2.0, -slope_y).normalize().to_array());
        }
    }

    let mut indices = Vec::new();
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let a = (y * width + x) as u32;
            let b = a + width as u32;
            indices.extend_from_slice(&[a, b, b + 1, a, b + 1, a + 1]);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

fn setup_scene(
    mut commands: Commands,
    terrain: Res<HeightMap>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let rect: CornerRect = terrain.corner_rect();
    let center = rect.world_center();
    let target = Vec3::new(center.x, 0.0, center.y);

    commands.spawn((
        Mesh3d(meshes.add(terrain_mesh(&terrain))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.45, 0.4, 0.3),
            perceptual_roughness: 0.9,
            ..default()
        })),
    ));
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(target + Vec3::new(-rect.width() as f32 * 0.4, 35.0, rect.height() as f32 * 0.9))
            .looking_at(target, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 30.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn toggle(flag: &mut bool, name: &str) {
    *flag = !*flag;
    info!("Water {} {}", name, if *flag { "on" } else { "off" });
}

fn water_settings_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<WaterSettings>,
    paths: Res<GameFolderPaths>,
) {
    let pressed = [
        KeyCode::F1,
        KeyCode::F2,
        KeyCode::F3,
        KeyCode::F4,
        KeyCode::F5,
        KeyCode::F6,
    ]
    .into_iter()
    .find(|key| keys.just_pressed(*key));
    let Some(key) = pressed else {
        return;
    };

    match key {
        KeyCode::F1 => toggle(&mut settings.translucency, "translucency"),
        KeyCode::F2 => toggle(&mut settings.reflections, "reflections"),
        KeyCode::F3 => toggle(&mut settings.bumpmapping, "bumpmapping"),
        KeyCode::F4 => toggle(&mut settings.animated_bumpmaps, "animated bumpmaps"),
        KeyCode::F5 => toggle(&mut settings.shader, "shader"),
        _ => toggle(&mut settings.dynamic_lod, "dynamic level of detail"),
    }

    let settings_path = paths.assets_folder_path.join(WATER_SETTINGS_PATH);
    if let Err(e) = write_water_settings_to_path(&settings, &settings_path) {
        error!("Failed to save water settings to {:?}: {}", settings_path, e);
    }
}

fn water_debug_keys(
    keys: Res<ButtonInput<KeyCode>>,
    manager: Res<WaterManager>,
    water: Res<WaterMap>,
    save_path: Res<LakeSavePath>,
) {
    if keys.just_pressed(KeyCode::F7) {
        info!("{}", manager.statistics_report());
    }
    if keys.just_pressed(KeyCode::F8) {
        match save_lake_records(&water.records(), &save_path.0) {
            Ok(()) => info!("Lakes successfully saved to {:?}", save_path.0),
            Err(e) => error!("Failed to save lakes to {:?}: {}", save_path.0, e),
        }
    }
}

fn main() {
    let args = Args::parse();

    let assets_folder = resolve_assets_folder(
        &FileAssetReader::get_base_path(),
        args.assets_folder_path.as_deref(),
    );
    let game_folder_paths = get_game_folder_paths(
        args.game_folder_path,
        Some(assets_folder.to_string_lossy().into_owned()),
    );
    println!(
        "Starting application with game folder: {}",
        game_folder_paths.game_folder_path.display()
    );

    let mut settings = load_water_settings(&game_folder_paths);
    if args.dynamic_lod {
        settings.dynamic_lod = true;
    }

    let terrain = load_terrain(&game_folder_paths, &args.map);
    let lakes_path = args
        .lakes
        .map(PathBuf::from)
        .unwrap_or_else(|| game_folder_paths.water_save_path(&args.map));
    let water = load_water(&terrain, &lakes_path);
    let explored = ExploredMap::fully_explored(
        terrain.width_corners() - 1,
        terrain.height_corners() - 1,
    );

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(AssetPlugin {
                file_path: game_folder_paths
                    .assets_folder_path
                    .to_string_lossy()
                    .into_owned(),
                unapproved_path_mode: bevy::asset::UnapprovedPathMode::Allow,
                ..Default::default()
            })
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Shoreline".to_string(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            }),
    );

    app.insert_resource(settings)
        .insert_resource(terrain)
        .insert_resource(water)
        .insert_resource(explored)
        .insert_resource(LakeSavePath(lakes_path))
        .insert_resource(game_folder_paths)
        .add_plugins(WaterPlugin)
        .add_systems(Startup, setup_scene)
        .add_systems(Update, (water_settings_keys, water_debug_keys))
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_shader_is_found_with_default_folders() {
        let base_path = Path::new(env!("CARGO_MANIFEST_DIR"));
        let assets = resolve_assets_folder(base_path, None);
        assert!(assets.join(constants::WATER_SHADER).exists());
    }

    #[test]
    fn test_absolute_assets_folder_is_kept() {
        let assets = resolve_assets_folder(Path::new("/opt/game"), Some("/srv/assets"));
        assert_eq!(assets, PathBuf::from("/srv/assets"));
        let assets = resolve_assets_folder(Path::new("/opt/game"), Some("assets"));
        assert_eq!(assets, PathBuf::from("/opt/game/assets"));
    }
}
