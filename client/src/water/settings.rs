use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use bevy::prelude::*;
use ron::{from_str, ser::PrettyConfig};
use serde::{Deserialize, Serialize};
use shared::GameFolderPaths;

use super::technique::WaterFeatures;
use crate::constants::WATER_SETTINGS_PATH;

/// Requested water quality. What is actually used depends on the backend.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    pub translucency: bool,
    pub reflections: bool,
    pub bumpmapping: bool,
    pub animated_bumpmaps: bool,
    pub shader: bool,
    /// Coarser geometry for distant chunks.
    pub dynamic_lod: bool,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            translucency: true,
            reflections: true,
            bumpmapping: true,
            animated_bumpmaps: true,
            shader: false,
            dynamic_lod: false,
        }
    }
}

impl WaterSettings {
    pub fn requested_features(&self) -> WaterFeatures {
        WaterFeatures {
            translucency: self.translucency,
            reflections: self.reflections,
            bumpmapping: self.bumpmapping,
            animated_bumpmaps: self.animated_bumpmaps,
            shader: self.shader,
        }
    }
}

/// Writes `settings` as pretty RON, creating the parent folder.
pub fn write_water_settings_to_path(
    settings: &WaterSettings,
    settings_path: &Path,
) -> Result<(), std::io::Error> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(3)
        .with_separate_tuple_members(true);

    let serialized = ron::ser::to_string_pretty(settings, pretty_config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    if let Some(parent) = settings_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(settings_path)?;
    file.write_all(serialized.as_bytes())
}

fn read_water_settings(settings_path: &Path) -> Option<WaterSettings> {
    let content = fs::read_to_string(settings_path).ok()?;
    match from_str::<WaterSettings>(&content) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring malformed water settings {:?}: {}", settings_path, e);
            None
        }
    }
}

/// Reads `water.ron` from the assets folder, writing the defaults there when
/// it is missing or unreadable.
pub fn load_water_settings(game_folder_paths: &GameFolderPaths) -> WaterSettings {
    let settings_path: PathBuf =
        Path::new(&game_folder_paths.assets_folder_path).join(WATER_SETTINGS_PATH);

    if let Some(settings) = read_water_settings(&settings_path) {
        return settings;
    }

    let settings = WaterSettings::default();
    if let Err(e) = write_water_settings_to_path(&settings, &settings_path) {
        error!(
            "Failed to create default water settings file at {:?}: {}",
            settings_path, e
        );
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths(name: &str) -> GameFolderPaths {
        let root = std::env::temp_dir().join(format!("shoreline-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        GameFolderPaths {
            game_folder_path: root.clone(),
            assets_folder_path: root.join("assets"),
            shaders_folder_path: root.join("assets").join("shaders"),
        }
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let paths = temp_paths("settings-missing");
        let settings = load_water_settings(&paths);
        assert_eq!(settings, WaterSettings::default());

        let written = paths.assets_folder_path.join(WATER_SETTINGS_PATH);
        assert!(written.exists());
        assert_eq!(read_water_settings(&written), Some(WaterSettings::default()));
        let _ = fs::remove_dir_all(&paths.game_folder_path);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let paths = temp_paths("settings-partial");
        let path = paths.assets_folder_path.join(WATER_SETTINGS_PATH);
        fs::create_dir_all(&paths.assets_folder_path).unwrap();
        fs::write(&path, "(shader: true, reflections: false)").unwrap();

        let settings = load_water_settings(&paths);
        assert!(settings.shader);
        assert!(!settings.reflections);
        assert!(settings.translucency);
        assert!(!settings.dynamic_lod);
        let _ = fs::remove_dir_all(&paths.game_folder_path);
    }

    #[test]
    fn test_requested_features_mirror_settings() {
        let settings = WaterSettings {
            bumpmapping: false,
            ..default()
        };
        let features = settings.requested_features();
        assert!(!features.bumpmapping);
        assert!(features.translucency);
        assert!(features.animated_bumpmaps);
        assert!(!features.shader);
    }
}
