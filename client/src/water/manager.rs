use std::{collections::HashMap, fmt};

use bevy::prelude::*;
use shared::{
    water::{Lake, LakeId, WaterMap},
    world::{FogOfWar, Terrain},
};

use super::{
    backend::{DrawKey, ShaderHandle, TextureHandle, WaterBackend},
    chunk_cache::ChunkCache,
    detail::WaterDetail,
    frustum::Frustum,
    settings::WaterSettings,
    technique::{negotiate, Downgrade, Technique, TechniqueContext, WaterFeatures},
};
use crate::constants::{
    ANIMATED_BUMP_FPS, TEXTURE_REPEAT, TEXTURE_SCROLL_SPEED, WATER_ANIMATED_BUMP_PREFIX,
    WATER_BUMP_TEXTURE, WATER_ENVIRONMENT_MAP, WATER_SHADER, WATER_TEXTURE, WATER_TIME_OFFSET,
};

/// Counters of the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStatistics {
    pub lakes: usize,
    pub chunks: usize,
    pub quads: usize,
}

impl fmt::Display for RenderStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  Lakes rendered: {}\n  Chunks rendered: {}\n  Quads rendered: {}",
            self.lakes, self.chunks, self.quads
        )
    }
}

#[derive(Debug, Default)]
struct WaterResources {
    base: Option<TextureHandle>,
    environment: Option<TextureHandle>,
    /// One entry for a static bump map, several when animated.
    bump_frames: Vec<TextureHandle>,
    shader: Option<ShaderHandle>,
    /// Set once a load pass ran, even if some loads failed.
    loaded: bool,
}

/// Render side state of one lake.
#[derive(Debug)]
struct RenderLake {
    caches: Vec<ChunkCache>,
    /// Set after a failed draw. The lake is drawn flat until the next reload.
    flat_fallback: bool,
}

impl RenderLake {
    fn new(chunk_count: usize) -> Self {
        Self {
            caches: (0..chunk_count).map(|_| ChunkCache::default()).collect(),
            flat_fallback: false,
        }
    }
}

/// Owns the negotiated technique, the backend resources and the chunk
/// caches of every lake, and draws the lakes of a [`WaterMap`] each frame.
#[derive(Resource, Debug, Default)]
pub struct WaterManager {
    settings: WaterSettings,
    /// What negotiation allowed, before resource failures.
    negotiated: WaterFeatures,
    /// What is actually in use.
    features: WaterFeatures,
    technique: Technique,
    downgrades: Vec<Downgrade>,
    /// Bumped whenever cached chunk geometry becomes stale.
    generation: u64,
    clock: f32,
    bump_frame: usize,
    resources: WaterResources,
    render_lakes: HashMap<LakeId, RenderLake>,
    statistics: RenderStatistics,
}

impl WaterManager {
    /// Negotiates `settings` against `backend` and loads the textures and
    /// shader the result needs.
    pub fn initialize(&mut self, settings: &WaterSettings, backend: &mut dyn WaterBackend) {
        self.settings = settings.clone();
        let negotiation = negotiate(&settings.requested_features(), &backend.capabilities());
        self.negotiated = negotiation.active;
        self.downgrades = negotiation.downgrades;
        self.load_resources(backend);
        self.generation += 1;
        info!(
            "Water initialized with {:?} ({} passes)",
            self.technique,
            self.technique.pass_count()
        );
    }

    /// Applies new settings. Caches and resources are only dropped when the
    /// negotiated feature set changes, or when nothing was loaded yet.
    pub fn reload_configuration(&mut self, settings: &WaterSettings, backend: &mut dyn WaterBackend) {
        self.settings = settings.clone();
        let negotiation = negotiate(&settings.requested_features(), &backend.capabilities());
        self.downgrades = negotiation.downgrades;
        if self.resources.loaded && negotiation.active == self.negotiated {
            debug!("Water configuration unchanged");
            return;
        }

        self.negotiated = negotiation.active;
        self.release_resources(backend);
        self.load_resources(backend);
        for render_lake in self.render_lakes.values_mut() {
            render_lake.flat_fallback = false;
        }
        self.generation += 1;
        info!(
            "Water reconfigured to {:?} ({} passes)",
            self.technique,
            self.technique.pass_count()
        );
    }

    fn release_resources(&mut self, backend: &mut dyn WaterBackend) {
        if let Some(shader) = self.resources.shader.take() {
            backend.release_shader(shader);
        }
        self.resources = WaterResources::default();
    }

    /// Loads what the negotiated features need. Every failed load switches
    /// off the features depending on it.
    fn load_resources(&mut self, backend: &mut dyn WaterBackend) {
        let mut features = self.negotiated;
        let mut resources = WaterResources {
            loaded: true,
            ..default()
        };

        match backend.load_texture(WATER_TEXTURE) {
            Ok(texture) => resources.base = Some(texture),
            Err(e) => error!("Water will be drawn untextured: {}", e),
        }

        if features.needs_environment_map() {
            match backend.load_environment_map(WATER_ENVIRONMENT_MAP) {
                Ok(texture) => resources.environment = Some(texture),
                Err(e) => {
                    error!("Disabling water reflections and shader: {}", e);
                    features.reflections = false;
                    features.shader = false;
                }
            }
        }

        if features.needs_bump_map() {
            if features.animated_bumpmaps {
                match backend.load_animated_texture(WATER_ANIMATED_BUMP_PREFIX) {
                    Ok(frames) if !frames.is_empty() => resources.bump_frames = frames,
                    Ok(_) => {
                        error!("No animated water bump map frames found, using a static one");
                        features.animated_bumpmaps = false;
                    }
                    Err(e) => {
                        error!("Using a static water bump map: {}", e);
                        features.animated_bumpmaps = false;
                    }
                }
            }
            if resources.bump_frames.is_empty() {
                match backend.load_texture(WATER_BUMP_TEXTURE) {
                    Ok(texture) => resources.bump_frames.push(texture),
                    Err(e) => {
                        error!("Disabling water bumpmapping and shader: {}", e);
                        features.bumpmapping = false;
                        features.shader = false;
                        features.animated_bumpmaps = false;
                    }
                }
            }
        }

        if features.shader {
            match backend.load_shader(WATER_SHADER) {
                Ok(shader) => resources.shader = Some(shader),
                Err(e) => {
                    error!("Disabling water shader: {}", e);
                    features.shader = false;
                }
            }
        }

        if !features.bumpmapping && !features.shader {
            features.animated_bumpmaps = false;
        }

        self.resources = resources;
        self.features = features;
        self.technique = Technique::from_features(&features);
        self.bump_frame = 0;
    }

    /// Advances the animation clock by `elapsed` seconds.
    pub fn update(&mut self, elapsed: f32) {
        self.clock += elapsed;
        let frames = self.resources.bump_frames.len();
        if self.features.animated_bumpmaps && frames > 1 {
            self.bump_frame = (self.time() * ANIMATED_BUMP_FPS) as usize % frames;
        }
    }

    /// Exploration changed, so the fogged cells of every chunk must be redone.
    pub fn fog_changed(&mut self) {
        self.generation += 1;
    }

    /// Lakes were added or reloaded.
    pub fn water_changed(&mut self) {
        self.render_lakes.clear();
    }

    pub fn time(&self) -> f32 {
        WATER_TIME_OFFSET + self.clock
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    pub fn features(&self) -> WaterFeatures {
        self.features
    }

    /// Features switched off by the last negotiation.
    pub fn downgrades(&self) -> &[Downgrade] {
        &self.downgrades
    }

    /// Chunk caches built for an older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &WaterSettings {
        &self.settings
    }

    pub fn statistics(&self) -> RenderStatistics {
        self.statistics
    }

    pub fn statistics_report(&self) -> String {
        format!("Water:\n{}", self.statistics)
    }

    fn context(&self, lake: &Lake) -> TechniqueContext {
        let time = self.time();
        let scroll = lake.wave_vector * (TEXTURE_SCROLL_SPEED * time);
        TechniqueContext {
            base: self.resources.base,
            environment: self.resources.environment,
            bump: self.resources.bump_frames.get(self.bump_frame).copied(),
            shader: self.resources.shader,
            texture_matrix: Mat4::from_translation(scroll.extend(0.0))
                * lake.texture_matrix()
                * Mat4::from_scale(Vec3::splat(TEXTURE_REPEAT)),
            wave_vector: lake.wave_vector,
            time,
        }
    }

    fn sync_lakes(&mut self, water: &WaterMap) {
        self.render_lakes.retain(|id, _| water.lake(*id).is_some());
        for lake in water.lakes() {
            let render_lake = self
                .render_lakes
                .entry(lake.id)
                .or_insert_with(|| RenderLake::new(lake.chunks.len()));
            if render_lake.caches.len() != lake.chunks.len() {
                *render_lake = RenderLake::new(lake.chunks.len());
            }
        }
    }

    /// Draws every visible chunk of every lake, in load order.
    pub fn render(
        &mut self,
        water: &WaterMap,
        terrain: &dyn Terrain,
        fog: &dyn FogOfWar,
        frustum: &Frustum,
        backend: &mut dyn WaterBackend,
    ) -> RenderStatistics {
        self.sync_lakes(water);
        let mut statistics = RenderStatistics::default();

        for lake in water.lakes() {
            if frustum.sphere_in_frustum(lake.center, lake.radius) == 0.0 {
                continue;
            }
            let (min, max) = lake.world_aabb();
            if !frustum.intersects_aabb(min, max) {
                continue;
            }

            let ctx = self.context(lake);
            let Some(render_lake) = self.render_lakes.get_mut(&lake.id) else {
                continue;
            };
            statistics.lakes += 1;
            let mut technique = if render_lake.flat_fallback {
                Technique::Flat
            } else {
                self.technique
            };

            for (index, chunk) in lake.chunks.iter().enumerate() {
                let distance = frustum.sphere_in_frustum(chunk.center, chunk.radius);
                if distance == 0.0 {
                    continue;
                }
                let (min, max) = chunk.world_aabb(lake.level);
                if !frustum.intersects_aabb(min, max) {
                    continue;
                }

                let detail = if self.settings.dynamic_lod {
                    WaterDetail::from_distance(distance)
                } else {
                    WaterDetail::FULL
                };
                let cache = &mut render_lake.caches[index];
                if cache.is_dirty(self.generation, detail) {
                    cache.rebuild(
                        lake,
                        chunk,
                        terrain,
                        fog,
                        detail,
                        self.technique.is_translucent(),
                        self.generation,
                    );
                }

                let key = DrawKey {
                    lake: lake.id,
                    chunk: index,
                };
                let batch = cache.batch(key, &technique);
                if batch.quad_count() == 0 {
                    continue;
                }

                let drawn = match technique.render(&batch, &ctx, backend) {
                    Err(e) if technique != Technique::Flat => {
                        error!("Drawing lake {} failed, falling back to flat water: {}", lake.id, e);
                        render_lake.flat_fallback = true;
                        technique = Technique::Flat;
                        let batch = cache.batch(key, &technique);
                        technique.render(&batch, &ctx, backend)
                    }
                    result => result,
                };
                match drawn {
                    Ok(quads) => {
                        statistics.chunks += 1;
                        statistics.quads += quads;
                    }
                    Err(e) => error!("Skipping chunk {} of lake {}: {}", index, lake.id, e),
                }
            }
        }

        self.statistics = statistics;
        statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::backend::{
        recording::RecordingBackend, BackendCapabilities, BlendMode, TextureRole,
    };
    use crate::water::frustum::{tests::box_frustum, Plane};
    use crate::water::technique::Feature;
    use shared::world::{ExploredMap, HeightMap, NoFog};

    /// 25×25 corners with walls on the border: one lake of nine chunks.
    fn basin(level: f32) -> (HeightMap, WaterMap) {
        let terrain = HeightMap::from_fn(25, 25, |x, y| {
            if x == 0 || y == 0 || x == 24 || y == 24 {
                5.0
            } else {
                0.0
            }
        });
        let mut water = WaterMap::new(&terrain);
        water
            .add_lake(IVec2::new(12, 12), terrain.corner_rect(), level, &terrain)
            .unwrap();
        (terrain, water)
    }

    fn flat_settings() -> WaterSettings {
        WaterSettings {
            translucency: false,
            reflections: false,
            bumpmapping: false,
            animated_bumpmaps: false,
            shader: false,
            dynamic_lod: false,
        }
    }

    fn manager_with(
        settings: &WaterSettings,
        backend: &mut RecordingBackend,
    ) -> WaterManager {
        let mut manager = WaterManager::default();
        manager.initialize(settings, backend);
        manager
    }

    fn chunk_cache(manager: &WaterManager, chunk: usize) -> &ChunkCache {
        &manager.render_lakes[&LakeId(0)].caches[chunk]
    }

    #[test]
    fn test_render_draws_every_visible_chunk() {
        let (terrain, water) = basin(1.0);
        assert_eq!(water.lakes()[0].chunks.len(), 9);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = manager_with(&WaterSettings::default(), &mut backend);
        assert_eq!(
            manager.technique(),
            Technique::Bumpmapped {
                translucent: true,
                reflections: true,
                animated: true
            }
        );

        let stats = manager.render(&water, &terrain, &NoFog, &box_frustum(1000.0), &mut backend);

        assert_eq!(
            stats,
            RenderStatistics {
                lakes: 1,
                chunks: 9,
                quads: 24 * 24
            }
        );
        let draws = backend.take_draws();
        assert_eq!(draws.len(), 18);
        assert_eq!(draws[0].pass.blend, BlendMode::Alpha);
        assert_eq!(draws[1].pass.blend, BlendMode::Additive);
        assert_eq!(
            manager.statistics_report(),
            "Water:\n  Lakes rendered: 1\n  Chunks rendered: 9\n  Quads rendered: 576"
        );
    }

    #[test]
    fn test_culling_by_lake_and_chunk() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = manager_with(&WaterSettings::default(), &mut backend);

        // Only the chunk at the origin reaches into a 10 unit box.
        let stats = manager.render(&water, &terrain, &NoFog, &box_frustum(5.0), &mut backend);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.quads, 100);

        let behind = Frustum {
            planes: [Plane::new(-1.0, 0.0, 0.0, -100.0); 6],
        };
        let stats = manager.render(&water, &terrain, &NoFog, &behind, &mut backend);
        assert_eq!(stats, RenderStatistics::default());
    }

    #[test]
    fn test_visible_lake_counts_without_drawn_chunks() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = manager_with(&flat_settings(), &mut backend);
        let fog = ExploredMap::new(24, 24);

        let stats = manager.render(&water, &terrain, &fog, &box_frustum(1000.0), &mut backend);

        assert_eq!(
            stats,
            RenderStatistics {
                lakes: 1,
                chunks: 0,
                quads: 0
            }
        );
        assert!(backend.take_draws().is_empty());
    }

    #[test]
    fn test_reload_before_initialize_loads_resources() {
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = WaterManager::default();

        manager.reload_configuration(&flat_settings(), &mut backend);

        assert_eq!(backend.loaded, vec![WATER_TEXTURE.to_string()]);
        assert_eq!(manager.technique(), Technique::Flat);
        assert_eq!(manager.generation(), 1);

        manager.reload_configuration(&flat_settings(), &mut backend);
        assert_eq!(backend.loaded.len(), 1);
        assert_eq!(manager.generation(), 1);
    }

    #[test]
    fn test_caches_survive_frames_and_unchanged_reloads() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let settings = WaterSettings::default();
        let mut manager = manager_with(&settings, &mut backend);
        let frustum = box_frustum(1000.0);

        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert_eq!(chunk_cache(&manager, 0).builds(), 1);

        let generation = manager.generation();
        manager.reload_configuration(&settings, &mut backend);
        assert_eq!(manager.generation(), generation);
        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert_eq!(chunk_cache(&manager, 0).builds(), 1);
    }

    #[test]
    fn test_toggling_translucency_rebuilds_alpha_buffer() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut settings = WaterSettings::default();
        let mut manager = manager_with(&settings, &mut backend);
        let frustum = box_frustum(1000.0);

        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert!(chunk_cache(&manager, 0).alphas().is_some());
        assert!(backend.take_draws()[0].alphas.is_some());

        settings.translucency = false;
        manager.reload_configuration(&settings, &mut backend);
        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert_eq!(chunk_cache(&manager, 0).builds(), 2);
        assert!(chunk_cache(&manager, 0).alphas().is_none());
        let draws = backend.take_draws();
        assert!(draws.iter().all(|draw| draw.alphas.is_none()));
        assert_eq!(draws[0].pass.blend, BlendMode::Opaque);

        settings.translucency = true;
        manager.reload_configuration(&settings, &mut backend);
        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert_eq!(chunk_cache(&manager, 0).builds(), 3);
        assert!(chunk_cache(&manager, 0).alphas().is_some());
    }

    #[test]
    fn test_dynamic_lod_rebuilds_on_detail_change() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let settings = WaterSettings {
            dynamic_lod: true,
            ..flat_settings()
        };
        let mut manager = manager_with(&settings, &mut backend);

        // Near plane 1000 units away: every chunk is drawn at the coarsest detail.
        let stats = manager.render(&water, &terrain, &NoFog, &box_frustum(1000.0), &mut backend);
        assert_eq!(stats.chunks, 9);
        assert_eq!(chunk_cache(&manager, 0).builds(), 1);

        manager.render(&water, &terrain, &NoFog, &box_frustum(30.0), &mut backend);
        assert_eq!(chunk_cache(&manager, 0).builds(), 2);
    }

    #[test]
    fn test_fast_path_draws_one_quad_per_chunk() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = manager_with(&flat_settings(), &mut backend);
        assert_eq!(manager.technique(), Technique::Flat);

        let stats = manager.render(&water, &terrain, &NoFog, &box_frustum(1000.0), &mut backend);
        assert_eq!(stats.chunks, 9);
        assert_eq!(stats.quads, 9);
        assert!(backend.take_draws().iter().all(|draw| draw.positions.len() == 4));

        // Translucent water fades out at the shore. Only the middle chunk
        // stays away from it and keeps a uniform alpha.
        let settings = WaterSettings {
            translucency: true,
            ..flat_settings()
        };
        manager.reload_configuration(&settings, &mut backend);
        let stats = manager.render(&water, &terrain, &NoFog, &box_frustum(1000.0), &mut backend);
        assert_eq!(stats.quads, 24 * 24 - 100 + 1);
    }

    #[test]
    fn test_deep_translucent_water_takes_fast_path() {
        let (terrain, water) = basin(10.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let settings = WaterSettings {
            translucency: true,
            ..flat_settings()
        };
        let mut manager = manager_with(&settings, &mut backend);

        let stats = manager.render(&water, &terrain, &NoFog, &box_frustum(1000.0), &mut backend);
        assert_eq!(stats.quads, stats.chunks);
        assert!(backend.take_draws().iter().all(|draw| draw.alpha == 1.0));
    }

    #[test]
    fn test_fog_change_rebuilds_geometry() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = manager_with(&flat_settings(), &mut backend);
        let frustum = box_frustum(1000.0);
        let mut fog = ExploredMap::fully_explored(24, 24);

        assert_eq!(manager.render(&water, &terrain, &fog, &frustum, &mut backend).chunks, 9);

        for y in 0..10 {
            for x in 0..10 {
                fog.unexplore(x, y);
            }
        }
        // Cached geometry is kept until told otherwise.
        assert_eq!(manager.render(&water, &terrain, &fog, &frustum, &mut backend).chunks, 9);

        manager.fog_changed();
        assert_eq!(manager.render(&water, &terrain, &fog, &frustum, &mut backend).chunks, 8);
    }

    #[test]
    fn test_failed_draw_falls_back_to_flat() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        backend.rejected_lakes.insert(LakeId(0));
        let mut manager = manager_with(&WaterSettings::default(), &mut backend);
        let frustum = box_frustum(1000.0);

        let stats = manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert_eq!(stats.chunks, 9);
        let draws = backend.take_draws();
        assert_eq!(draws.len(), 9);
        assert!(draws.iter().all(|draw| draw.pass.name == "flat"));

        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        assert!(backend.take_draws().iter().all(|draw| draw.pass.name == "flat"));
    }

    #[test]
    fn test_missing_environment_map_disables_reflections() {
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        backend.missing.insert(WATER_ENVIRONMENT_MAP.to_string());
        backend.missing.insert(WATER_ANIMATED_BUMP_PREFIX.to_string());
        let manager = manager_with(&WaterSettings::default(), &mut backend);

        assert_eq!(
            manager.technique(),
            Technique::Bumpmapped {
                translucent: true,
                reflections: false,
                animated: false
            }
        );
        assert!(backend.loaded.contains(&WATER_BUMP_TEXTURE.to_string()));
    }

    #[test]
    fn test_shader_failure_keeps_fixed_function_water() {
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        backend.missing.insert(WATER_SHADER.to_string());
        let settings = WaterSettings {
            shader: true,
            ..default()
        };
        let manager = manager_with(&settings, &mut backend);

        assert!(!manager.features().shader);
        assert!(matches!(manager.technique(), Technique::Bumpmapped { .. }));
    }

    #[test]
    fn test_reload_releases_shader() {
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut settings = WaterSettings {
            shader: true,
            ..default()
        };
        let mut manager = manager_with(&settings, &mut backend);
        assert!(matches!(manager.technique(), Technique::Shaded { .. }));
        let shader = manager.resources.shader;
        assert!(shader.is_some());

        settings.shader = false;
        manager.reload_configuration(&settings, &mut backend);
        assert_eq!(backend.released_shaders, shader.into_iter().collect::<Vec<_>>());
        assert!(manager.resources.shader.is_none());
    }

    #[test]
    fn test_missing_cube_maps_reported_once() {
        let caps = BackendCapabilities {
            cube_maps: false,
            ..BackendCapabilities::full(4)
        };
        let mut backend = RecordingBackend::new(caps);
        let manager = manager_with(&WaterSettings::default(), &mut backend);

        assert!(!manager.features().reflections);
        assert_eq!(manager.downgrades().len(), 1);
        assert_eq!(manager.downgrades()[0].feature, Feature::Reflections);
    }

    #[test]
    fn test_animated_bump_frames_follow_the_clock() {
        let (terrain, water) = basin(1.0);
        let mut backend = RecordingBackend::new(BackendCapabilities::full(4));
        let mut manager = manager_with(&WaterSettings::default(), &mut backend);
        let frustum = box_frustum(1000.0);

        let bump = |backend: &mut RecordingBackend| {
            backend.take_draws()[0]
                .pass
                .layer(TextureRole::Bump)
                .map(|layer| layer.texture)
        };

        manager.update(0.0);
        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        let first = bump(&mut backend);
        manager.update(1.0 / ANIMATED_BUMP_FPS);
        manager.render(&water, &terrain, &NoFog, &frustum, &mut backend);
        let second = bump(&mut backend);

        assert!(first.is_some());
        assert_ne!(first, second);
        assert!((manager.time() - WATER_TIME_OFFSET - 1.0 / ANIMATED_BUMP_FPS).abs() < 1e-5);
    }
}
