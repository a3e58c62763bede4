//! Choosing how water is drawn.
//!
//! The requested feature set comes from [`WaterSettings`]; every feature the
//! backend cannot provide is switched off with a warning, and the remaining
//! set is turned into one [`Technique`].
//!
//! [`WaterSettings`]: super::settings::WaterSettings

use std::fmt;

use bevy::prelude::*;

use super::backend::{
    BackendCapabilities, BackendError, BlendMode, PassState, QuadBatch, ShaderHandle,
    SurfaceLighting, TextureHandle, TextureLayer, TextureRole, WaterBackend,
};
use crate::constants::{
    REFLECTION_STRENGTH, WATER_AMBIENT, WATER_DIFFUSE, WATER_SHININESS, WATER_SPECULAR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaterFeatures {
    pub translucency: bool,
    pub reflections: bool,
    pub bumpmapping: bool,
    pub animated_bumpmaps: bool,
    pub shader: bool,
}

impl WaterFeatures {
    pub fn needs_environment_map(&self) -> bool {
        self.shader || self.reflections
    }

    pub fn needs_bump_map(&self) -> bool {
        self.shader || self.bumpmapping
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Translucency,
    Reflections,
    Bumpmapping,
    AnimatedBumpmaps,
    Shader,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Translucency => "translucency",
            Feature::Reflections => "reflections",
            Feature::Bumpmapping => "bumpmapping",
            Feature::AnimatedBumpmaps => "animated bumpmaps",
            Feature::Shader => "water shader",
        };
        f.write_str(name)
    }
}

/// A requested feature that had to be switched off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downgrade {
    pub feature: Feature,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    pub active: WaterFeatures,
    pub downgrades: Vec<Downgrade>,
}

/// Keeps each requested feature the backend supports. Never fails.
pub fn negotiate(requested: &WaterFeatures, caps: &BackendCapabilities) -> Negotiation {
    let mut active = WaterFeatures::default();
    let mut downgrades = Vec::new();
    let mut keep = |wanted: bool, supported: bool, feature: Feature, reason: &'static str| {
        if wanted && !supported {
            downgrades.push(Downgrade { feature, reason });
        }
        wanted && supported
    };

    active.translucency = keep(
        requested.translucency,
        caps.supports_translucency(),
        Feature::Translucency,
        "needs two texture units and texture combiners",
    );
    active.reflections = keep(
        requested.reflections,
        caps.supports_reflections(),
        Feature::Reflections,
        "needs two texture units, cube maps and texture combiners",
    );
    active.bumpmapping = keep(
        requested.bumpmapping,
        caps.supports_bumpmapping(),
        Feature::Bumpmapping,
        "needs two texture units, dot3 combiners and constant blend color",
    );
    active.shader = keep(
        requested.shader,
        caps.supports_shaders(),
        Feature::Shader,
        "needs shader objects and three texture units",
    );

    if requested.animated_bumpmaps {
        if active.bumpmapping || active.shader {
            active.animated_bumpmaps = true;
        } else if !caps.supports_bumpmapping() && !caps.supports_shaders() {
            downgrades.push(Downgrade {
                feature: Feature::AnimatedBumpmaps,
                reason: "needs bumpmapping or the water shader",
            });
        } else {
            debug!("Animated bumpmaps requested without bumpmapping or shader, ignoring");
        }
    }

    for downgrade in &downgrades {
        warn!(
            "Water {} disabled: {}",
            downgrade.feature, downgrade.reason
        );
    }

    Negotiation { active, downgrades }
}

/// Everything a technique needs besides the geometry.
#[derive(Debug, Clone, Copy)]
pub struct TechniqueContext {
    pub base: Option<TextureHandle>,
    pub environment: Option<TextureHandle>,
    pub bump: Option<TextureHandle>,
    pub shader: Option<ShaderHandle>,
    pub texture_matrix: Mat4,
    pub wave_vector: Vec2,
    pub time: f32,
}

impl TechniqueContext {
    fn layer(&self, role: TextureRole, texture: Option<TextureHandle>) -> Option<TextureLayer> {
        texture.map(|texture| TextureLayer {
            role,
            texture,
            matrix: self.texture_matrix,
        })
    }

    fn layers(&self, roles: &[TextureRole]) -> Vec<TextureLayer> {
        roles
            .iter()
            .filter_map(|role| {
                let texture = match role {
                    TextureRole::Base => self.base,
                    TextureRole::Bump => self.bump,
                    TextureRole::Environment => self.environment,
                };
                self.layer(*role, texture)
            })
            .collect()
    }

    fn pass(&self, name: &'static str, blend: BlendMode, roles: &[TextureRole]) -> PassState {
        PassState {
            name,
            blend,
            depth_write: true,
            color: Vec4::ONE,
            lighting: Some(SurfaceLighting {
                ambient: WATER_AMBIENT,
                diffuse: WATER_DIFFUSE,
                specular: WATER_SPECULAR,
                shininess: WATER_SHININESS,
            }),
            layers: self.layers(roles),
            shader: None,
            reflection_strength: 0.0,
            wave_vector: self.wave_vector,
            time: self.time,
        }
    }
}

fn blend_for(translucent: bool) -> BlendMode {
    if translucent {
        BlendMode::Alpha
    } else {
        BlendMode::Opaque
    }
}

/// How chunks are drawn, derived from the active feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Technique {
    #[default]
    Flat,
    Translucent,
    Reflective {
        translucent: bool,
    },
    /// Two passes: N·L lighting from the bump map, then ambient and
    /// reflections added on top.
    Bumpmapped {
        translucent: bool,
        reflections: bool,
        animated: bool,
    },
    Shaded {
        translucent: bool,
        animated: bool,
    },
}

impl Technique {
    /// Picks the richest variant the feature set allows.
    pub fn from_features(features: &WaterFeatures) -> Self {
        if features.shader {
            Technique::Shaded {
                translucent: features.translucency,
                animated: features.animated_bumpmaps,
            }
        } else if features.bumpmapping {
            Technique::Bumpmapped {
                translucent: features.translucency,
                reflections: features.reflections,
                animated: features.animated_bumpmaps,
            }
        } else if features.reflections {
            Technique::Reflective {
                translucent: features.translucency,
            }
        } else if features.translucency {
            Technique::Translucent
        } else {
            Technique::Flat
        }
    }

    pub fn is_translucent(&self) -> bool {
        match self {
            Technique::Flat => false,
            Technique::Translucent => true,
            Technique::Reflective { translucent }
            | Technique::Bumpmapped { translucent, .. }
            | Technique::Shaded { translucent, .. } => *translucent,
        }
    }

    pub fn uses_reflections(&self) -> bool {
        match self {
            Technique::Flat | Technique::Translucent => false,
            Technique::Reflective { .. } | Technique::Shaded { .. } => true,
            Technique::Bumpmapped { reflections, .. } => *reflections,
        }
    }

    /// Draws submitted per chunk.
    pub fn pass_count(&self) -> usize {
        match self {
            Technique::Bumpmapped { .. } => 2,
            _ => 1,
        }
    }

    /// Render state of every pass, in draw order.
    pub fn passes(&self, ctx: &TechniqueContext) -> Vec<PassState> {
        use TextureRole::*;

        match *self {
            Technique::Flat => vec![ctx.pass("flat", BlendMode::Opaque, &[Base])],
            Technique::Translucent => vec![ctx.pass("translucent", BlendMode::Alpha, &[Base])],
            Technique::Reflective { translucent } => {
                let mut pass = ctx.pass("reflective", blend_for(translucent), &[Base, Environment]);
                pass.reflection_strength = REFLECTION_STRENGTH;
                vec![pass]
            }
            Technique::Bumpmapped {
                translucent,
                reflections,
                ..
            } => {
                let mut diffuse = ctx.pass("bump-diffuse", blend_for(translucent), &[Bump, Base]);
                if let Some(lighting) = diffuse.lighting.as_mut() {
                    lighting.ambient = 0.0;
                }

                let roles: &[TextureRole] = if reflections {
                    &[Base, Environment]
                } else {
                    &[Base]
                };
                let mut ambient = ctx.pass("bump-ambient", BlendMode::Additive, roles);
                ambient.depth_write = false;
                ambient.lighting = None;
                let strength = if reflections { REFLECTION_STRENGTH } else { 0.0 };
                ambient.reflection_strength = strength;
                let ambient_level = WATER_AMBIENT * (1.0 - strength);
                ambient.color = Vec4::new(ambient_level, ambient_level, ambient_level, 1.0);
                vec![diffuse, ambient]
            }
            Technique::Shaded { translucent, .. } => {
                let mut pass =
                    ctx.pass("shaded", blend_for(translucent), &[Base, Bump, Environment]);
                pass.shader = ctx.shader;
                pass.reflection_strength = REFLECTION_STRENGTH;
                vec![pass]
            }
        }
    }

    /// Draws `batch` once per pass. Returns the number of quads submitted.
    pub fn render(
        &self,
        batch: &QuadBatch<'_>,
        ctx: &TechniqueContext,
        backend: &mut dyn WaterBackend,
    ) -> Result<usize, BackendError> {
        for pass in self.passes(ctx) {
            backend.draw_quads(batch, &pass)?;
        }
        Ok(batch.quad_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested_all() -> WaterFeatures {
        WaterFeatures {
            translucency: true,
            reflections: true,
            bumpmapping: true,
            animated_bumpmaps: true,
            shader: true,
        }
    }

    fn context() -> TechniqueContext {
        TechniqueContext {
            base: Some(TextureHandle(1)),
            environment: Some(TextureHandle(2)),
            bump: Some(TextureHandle(3)),
            shader: Some(ShaderHandle(4)),
            texture_matrix: Mat4::IDENTITY,
            wave_vector: Vec2::X,
            time: 0.0,
        }
    }

    #[test]
    fn test_missing_cube_maps_only_drops_reflections() {
        let caps = BackendCapabilities {
            cube_maps: false,
            ..BackendCapabilities::full(4)
        };
        let requested = WaterFeatures {
            reflections: true,
            ..default()
        };

        let negotiation = negotiate(&requested, &caps);

        assert!(!negotiation.active.reflections);
        assert_eq!(negotiation.active, WaterFeatures::default());
        assert_eq!(
            negotiation.downgrades,
            vec![Downgrade {
                feature: Feature::Reflections,
                reason: "needs two texture units, cube maps and texture combiners",
            }]
        );
    }

    #[test]
    fn test_full_backend_keeps_everything() {
        let negotiation = negotiate(&requested_all(), &BackendCapabilities::full(8));
        assert_eq!(negotiation.active, requested_all());
        assert!(negotiation.downgrades.is_empty());
    }

    #[test]
    fn test_single_texture_unit_drops_all_multitexture_features() {
        let caps = BackendCapabilities::full(1);
        let negotiation = negotiate(&requested_all(), &caps);

        assert_eq!(negotiation.active, WaterFeatures::default());
        let dropped: Vec<Feature> = negotiation.downgrades.iter().map(|d| d.feature).collect();
        assert_eq!(
            dropped,
            vec![
                Feature::Translucency,
                Feature::Reflections,
                Feature::Bumpmapping,
                Feature::Shader,
                Feature::AnimatedBumpmaps,
            ]
        );
    }

    #[test]
    fn test_shader_needs_three_units() {
        let caps = BackendCapabilities::full(2);
        let negotiation = negotiate(&requested_all(), &caps);
        assert!(!negotiation.active.shader);
        assert!(negotiation.active.bumpmapping);
        assert!(negotiation.active.animated_bumpmaps);
        assert_eq!(negotiation.downgrades.len(), 1);
    }

    #[test]
    fn test_animation_alone_is_dropped_quietly() {
        let requested = WaterFeatures {
            animated_bumpmaps: true,
            ..default()
        };
        let negotiation = negotiate(&requested, &BackendCapabilities::full(4));
        assert!(!negotiation.active.animated_bumpmaps);
        assert!(negotiation.downgrades.is_empty());
    }

    #[test]
    fn test_technique_selection() {
        assert_eq!(Technique::from_features(&WaterFeatures::default()), Technique::Flat);
        assert_eq!(
            Technique::from_features(&WaterFeatures {
                translucency: true,
                ..default()
            }),
            Technique::Translucent
        );
        assert_eq!(
            Technique::from_features(&WaterFeatures {
                reflections: true,
                bumpmapping: true,
                ..default()
            }),
            Technique::Bumpmapped {
                translucent: false,
                reflections: true,
                animated: false
            }
        );
        assert_eq!(
            Technique::from_features(&requested_all()),
            Technique::Shaded {
                translucent: true,
                animated: true
            }
        );
    }

    #[test]
    fn test_bumpmapping_draws_two_passes() {
        let technique = Technique::Bumpmapped {
            translucent: false,
            reflections: true,
            animated: false,
        };
        let passes = technique.passes(&context());

        assert_eq!(passes.len(), technique.pass_count());
        assert_eq!(passes[0].blend, BlendMode::Opaque);
        assert!(passes[0].layer(TextureRole::Bump).is_some());
        assert_eq!(passes[1].blend, BlendMode::Additive);
        assert!(!passes[1].depth_write);
        assert!(passes[1].layer(TextureRole::Environment).is_some());
        assert!((passes[1].color.x - WATER_AMBIENT * 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_shaded_is_a_single_pass_with_program() {
        let passes = Technique::Shaded {
            translucent: true,
            animated: false,
        }
        .passes(&context());
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].shader, Some(ShaderHandle(4)));
        assert_eq!(passes[0].blend, BlendMode::Alpha);
        assert_eq!(passes[0].layers.len(), 3);
    }
}
