use std::path::PathBuf;

use bevy_ecs::resource::Resource;
use bevy_log::debug;

pub mod constants;
pub mod water;
pub mod world;

pub use constants::*;

#[derive(Resource, Debug, Clone)]
pub struct GameFolderPaths {
    pub game_folder_path: PathBuf,
    pub assets_folder_path: PathBuf,
    pub shaders_folder_path: PathBuf,
}

impl GameFolderPaths {
    /// Location of the persisted lake records for a given map.
    pub fn water_save_path(&self, map_name: &str) -> PathBuf {
        self.game_folder_path
            .join("maps")
            .join(map_name)
            .join(WATER_SAVE_FILE_NAME)
    }

    pub fn height_map_path(&self, map_name: &str) -> PathBuf {
        self.game_folder_path
            .join("maps")
            .join(map_name)
            .join(HEIGHT_MAP_FILE_NAME)
    }
}

pub fn get_game_folder_paths(
    game_folder_path: Option<String>,
    assets_folder_path: Option<String>,
) -> GameFolderPaths {
    let mut paths = default_game_folder_paths();

    if let Some(game_data) = game_folder_path {
        paths.game_folder_path = game_data.into();
    }
    if let Some(game_assets) = assets_folder_path {
        paths.shaders_folder_path = PathBuf::from(&game_assets).join("shaders");
        paths.assets_folder_path = game_assets.into();
    }

    debug!("Using game folder paths: {:?}", paths);
    paths
}

#[cfg(target_os = "windows")]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "%AppData/shoreline".into(),
        assets_folder_path: "%AppData/shoreline/data".into(),
        shaders_folder_path: "%AppData/shoreline/data/shaders".into(),
    }
}

#[cfg(target_os = "linux")]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "$HOME/.local/share/shoreline".into(),
        assets_folder_path: "$HOME/.config/shoreline".into(),
        shaders_folder_path: "$HOME/.config/shoreline/shaders".into(),
    }
}

#[cfg(target_os = "macos")]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "$HOME/Library/Application Support/shoreline".into(),
        assets_folder_path: "$HOME/Library/Application Support/shoreline/data".into(),
        shaders_folder_path: "$HOME/Library/Application Support/shoreline/data/shaders".into(),
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "shoreline".into(),
        assets_folder_path: "shoreline/data".into(),
        shaders_folder_path: "shoreline/data/shaders".into(),
    }
}
