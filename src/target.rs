//! Capabilities the host exposes for its live objects.
//!
//! The override engine never owns scene objects. It reads a flat set of
//! fields, writes the same set back, and walks indexed children. Hosts
//! implement these traits on their own scene types (or on thin adapters).

use crate::cache::{ResourceCache, Texture, TextureKind};
use crate::models::math::{Color, Transform};
use crate::overrides::light::LightSettings;
use camino::Utf8Path;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to geometry owned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub Arc<str>);

impl MeshHandle {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait RendererTarget {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn mesh(&self) -> Option<MeshHandle>;
    fn set_mesh(&mut self, mesh: MeshHandle);
}

/// A positioned object with renderers and moddable children.
pub trait ObjectTarget {
    fn name(&self) -> &str;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
    fn local_transform(&self) -> Transform;
    fn set_local_transform(&mut self, transform: Transform);

    fn renderer_count(&self) -> usize;
    fn renderer(&self, index: usize) -> Option<&dyn RendererTarget>;
    fn renderer_mut(&mut self, index: usize) -> Option<&mut dyn RendererTarget>;

    fn child_count(&self) -> usize;
    fn child(&self, index: usize) -> Option<&dyn ObjectTarget>;
    fn child_mut(&mut self, index: usize) -> Option<&mut dyn ObjectTarget>;
}

/// External component that fades a light between per-state intensities.
///
/// The engine only hands it the two values and toggles it; the fading
/// itself belongs to the host.
pub trait StateLightController {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn intensity_waiting(&self) -> f32;
    fn set_intensity_waiting(&mut self, intensity: f32);
    fn intensity_playing(&self) -> f32;
    fn set_intensity_playing(&mut self, intensity: f32);
}

pub trait LightTarget {
    fn name(&self) -> &str;
    /// Activity of the object carrying the light.
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
    /// Enabled flag of the light component itself.
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn local_transform(&self) -> Transform;
    fn set_local_transform(&mut self, transform: Transform);
    fn settings(&self) -> LightSettings;
    fn set_settings(&mut self, settings: LightSettings);
    fn state_controller(&self) -> Option<&dyn StateLightController>;
    fn state_controller_mut(&mut self) -> Option<&mut dyn StateLightController>;
}

/// Value of a named shader parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderValue {
    Float(f32),
    Color(Color),
}

/// Skybox material as the engine sees it: a shader name, its named
/// parameters, and the bound main texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyboxMaterial {
    pub name: String,
    pub shader: String,
    pub params: IndexMap<String, ShaderValue>,
    pub main_texture: Option<Arc<Texture>>,
}

impl SkyboxMaterial {
    pub const PANORAMIC_SHADER: &'static str = "Skybox/Panoramic";

    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: shader.into(),
            params: IndexMap::new(),
            main_texture: None,
        }
    }

    /// Template used when the host does not provide one.
    pub fn panoramic() -> Self {
        Self::new("Moddable Skybox", Self::PANORAMIC_SHADER)
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.params.insert(name.to_string(), ShaderValue::Float(value));
    }

    pub fn set_color(&mut self, name: &str, value: Color) {
        self.params.insert(name.to_string(), ShaderValue::Color(value));
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.params.get(name) {
            Some(ShaderValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        match self.params.get(name) {
            Some(ShaderValue::Color(value)) => Some(*value),
            _ => None,
        }
    }

    /// Bind `_MainTex`.
    pub fn set_main_texture(&mut self, texture: Arc<Texture>) {
        self.main_texture = Some(texture);
    }
}

/// Owner of the active skybox (the render environment).
pub trait SkyboxTarget {
    fn skybox(&self) -> Option<&SkyboxMaterial>;
    fn set_skybox(&mut self, material: SkyboxMaterial);

    /// Recompute ambient lighting after the skybox changed.
    fn refresh_environment(&mut self) {}
}

/// The full set of moddable things in an arena.
pub trait ArenaScene: SkyboxTarget {
    fn object_count(&self) -> usize;
    fn object(&self, index: usize) -> Option<&dyn ObjectTarget>;
    fn object_mut(&mut self, index: usize) -> Option<&mut dyn ObjectTarget>;

    fn light_count(&self) -> usize;
    fn light(&self, index: usize) -> Option<&dyn LightTarget>;
    fn light_mut(&mut self, index: usize) -> Option<&mut dyn LightTarget>;
}

/// Host hook for turning a model reference into geometry.
pub trait MeshLoader: Send + Sync {
    fn load_mesh(&self, base_path: &Utf8Path, reference: &str) -> Option<MeshHandle>;
}

/// Load a texture for a mod, going through `cache`.
pub(crate) fn load_mod_texture(
    cache: &ResourceCache,
    base_path: &Utf8Path,
    relative_name: &str,
    use_cache: bool,
    kind: TextureKind,
) -> Option<Arc<Texture>> {
    if relative_name.is_empty() {
        None
    } else {
        Some(cache.load(base_path, relative_name, use_cache, kind))
    }
}
