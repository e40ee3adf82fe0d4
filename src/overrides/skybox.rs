use crate::cache::{ResourceCache, TextureKind};
use crate::models::math::Color;
use crate::target::{SkyboxMaterial, SkyboxTarget, load_mod_texture};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

pub const PARAM_TINT: &str = "_Tint";
pub const PARAM_EXPOSURE: &str = "_Exposure";
pub const PARAM_ROTATION: &str = "_Rotation";
pub const PARAM_MAPPING: &str = "_Mapping";
pub const PARAM_IMAGE_TYPE: &str = "_ImageType";
pub const PARAM_MIRROR_ON_BACK: &str = "_MirrorOnBack";
pub const PARAM_LAYOUT: &str = "_Layout";

/// Skybox override for a panoramic shader.
///
/// Unlike the other overrides this one has no `modThis` flag: a texture
/// means "replace the skybox", no texture means "use the default one".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkyboxOverride {
    /// png or jpg, relative to the mod folder.
    #[serde(alias = "skyboxTexture")]
    pub texture: String,

    #[serde(alias = "skyboxTintColor")]
    pub tint: Color,

    /// 0 to 8.
    #[serde(alias = "skyboxExposure")]
    pub exposure: f32,

    /// Degrees, 0 to 360.
    #[serde(alias = "skyboxRotation")]
    pub rotation: f32,

    /// 0: six frames layout, 1: latitude/longitude layout.
    #[serde(alias = "skyboxMapping")]
    pub mapping: f32,

    /// Latitude/longitude only. 0: 360 degrees, 1: 180 degrees.
    #[serde(alias = "skyboxImageType")]
    pub image_type: f32,

    /// 0: no, 1: yes.
    #[serde(alias = "skyboxMirrorOnBack")]
    pub mirror_on_back: f32,

    /// 0: none, 1: side by side, 2: over under.
    #[serde(rename = "layout3D", alias = "skybox3DLayout")]
    pub layout_3d: f32,

    /// Material that was active when captured from a live environment.
    #[serde(skip)]
    captured: Option<SkyboxMaterial>,
}

impl Default for SkyboxOverride {
    fn default() -> Self {
        Self {
            texture: String::new(),
            tint: Color::GRAY,
            exposure: 1.0,
            rotation: 0.0,
            mapping: 1.0,
            image_type: 0.0,
            mirror_on_back: 0.0,
            layout_3d: 0.0,
            captured: None,
        }
    }
}

impl PartialEq for SkyboxOverride {
    fn eq(&self, other: &Self) -> bool {
        self.texture == other.texture
            && self.tint == other.tint
            && self.exposure == other.exposure
            && self.rotation == other.rotation
            && self.mapping == other.mapping
            && self.image_type == other.image_type
            && self.mirror_on_back == other.mirror_on_back
            && self.layout_3d == other.layout_3d
    }
}

impl SkyboxOverride {
    /// Record the environment's current skybox. Applying the result puts
    /// that exact material back.
    pub fn capture_from<E: SkyboxTarget + ?Sized>(env: &E) -> Self {
        Self {
            captured: env.skybox().cloned(),
            ..Default::default()
        }
    }

    pub fn captured(&self) -> Option<&SkyboxMaterial> {
        self.captured.as_ref()
    }

    /// Build the replacement material from `template`, decoding the texture
    /// through `cache`. `None` when no texture is configured.
    pub fn build_material(
        &self,
        template: &SkyboxMaterial,
        cache: &ResourceCache,
        base_path: &Utf8Path,
        use_cache: bool,
    ) -> Option<SkyboxMaterial> {
        let texture = load_mod_texture(cache, base_path, &self.texture, use_cache, TextureKind::Skybox)?;

        let mut material = template.clone();
        material.name = self.texture.clone();
        material.set_main_texture(texture);
        Some(material)
    }

    fn write_params(&self, material: &mut SkyboxMaterial) {
        material.set_color(PARAM_TINT, self.tint);
        material.set_float(PARAM_EXPOSURE, self.exposure);
        material.set_float(PARAM_ROTATION, self.rotation);
        material.set_float(PARAM_MAPPING, self.mapping);
        material.set_float(PARAM_IMAGE_TYPE, self.image_type);
        material.set_float(PARAM_MIRROR_ON_BACK, self.mirror_on_back);
        material.set_float(PARAM_LAYOUT, self.layout_3d);
    }

    /// Push a skybox onto `env` and refresh its lighting.
    ///
    /// A captured material wins and is set untouched. Otherwise `built`
    /// (from [`build_material`](Self::build_material)) gets the shader
    /// parameters written, and without either the environment falls back to
    /// `default_skybox`.
    pub fn apply_to<E: SkyboxTarget + ?Sized>(
        &self,
        env: &mut E,
        built: Option<SkyboxMaterial>,
        default_skybox: Option<&SkyboxMaterial>,
    ) {
        if let Some(original) = &self.captured {
            env.set_skybox(original.clone());
            tracing::debug!("Restored captured skybox: {}", original.name);
        } else if let Some(mut material) = built {
            self.write_params(&mut material);
            tracing::debug!("Updated skybox to: {}", material.name);
            env.set_skybox(material);
        } else if let Some(default) = default_skybox {
            env.set_skybox(default.clone());
            tracing::debug!("Restored default skybox: {}", default.name);
        }
        env.refresh_environment();
    }
}
