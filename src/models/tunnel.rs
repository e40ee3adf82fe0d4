use super::math::Vec3;
use crate::cache::{ResourceCache, Texture, TextureKind};
use crate::target::load_mod_texture;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Gameplay states the tunnel and post-processing visuals react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComboState {
    Normal,
    ComboX2,
    ComboX3,
    ComboX4,
    ComboLong,
}

impl ComboState {
    pub const ALL: [ComboState; 5] = [
        ComboState::Normal,
        ComboState::ComboX2,
        ComboState::ComboX3,
        ComboState::ComboX4,
        ComboState::ComboLong,
    ];

    /// Parse the document key (`comboX2`); case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            ComboState::Normal => "normal",
            ComboState::ComboX2 => "comboX2",
            ComboState::ComboX3 => "comboX3",
            ComboState::ComboX4 => "comboX4",
            ComboState::ComboLong => "comboLong",
        }
    }

    /// Position in [`ComboState::ALL`] and in `states()` arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// `TunnelMod.json`: tunnel visuals per combo state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TunnelMod {
    /// State to show right after loading (authoring preview); empty for none.
    pub activate_state: String,
    pub use_cache: bool,
    pub normal: TunnelState,
    pub combo_x2: TunnelState,
    pub combo_x3: TunnelState,
    pub combo_x4: TunnelState,
    pub combo_long: TunnelState,
}

impl Default for TunnelMod {
    fn default() -> Self {
        Self {
            activate_state: String::new(),
            use_cache: true,
            normal: TunnelState::default(),
            combo_x2: TunnelState::default(),
            combo_x3: TunnelState::default(),
            combo_x4: TunnelState::default(),
            combo_long: TunnelState::default(),
        }
    }
}

impl TunnelMod {
    /// All states in [`ComboState`] order.
    pub fn states(&self) -> [&TunnelState; 5] {
        [
            &self.normal,
            &self.combo_x2,
            &self.combo_x3,
            &self.combo_x4,
            &self.combo_long,
        ]
    }

    pub fn state(&self, key: ComboState) -> &TunnelState {
        self.states()[key.index()]
    }

    fn states_mut(&mut self) -> [&mut TunnelState; 5] {
        [
            &mut self.normal,
            &mut self.combo_x2,
            &mut self.combo_x3,
            &mut self.combo_x4,
            &mut self.combo_long,
        ]
    }

    pub fn active_state(&self) -> Option<ComboState> {
        if self.activate_state.is_empty() {
            None
        } else {
            ComboState::from_name(&self.activate_state)
        }
    }

    /// Decode every referenced layer texture from the mod folder.
    pub fn load_textures(&mut self, cache: &ResourceCache, base_path: &Utf8Path) {
        let use_cache = self.use_cache;
        for state in self.states_mut() {
            for layer in state.layers_mut() {
                layer.loaded_texture =
                    load_mod_texture(cache, base_path, &layer.texture, use_cache, TextureKind::Standard);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TunnelState {
    pub transition_time: f32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub segments: u32,
    pub stretch: f32,
    pub layer1: TunnelLayer,
    pub layer2: TunnelLayer,
    pub layer3: TunnelLayer,
}

impl Default for TunnelState {
    fn default() -> Self {
        Self {
            transition_time: 0.3,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            segments: 32,
            stretch: 0.0,
            layer1: TunnelLayer::default(),
            layer2: TunnelLayer::default(),
            layer3: TunnelLayer::default(),
        }
    }
}

impl TunnelState {
    pub fn layers(&self) -> [&TunnelLayer; 3] {
        [&self.layer1, &self.layer2, &self.layer3]
    }

    fn layers_mut(&mut self) -> [&mut TunnelLayer; 3] {
        [&mut self.layer1, &mut self.layer2, &mut self.layer3]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TunnelLayer {
    pub alpha: f32,
    pub speed: f32,
    pub rotation: f32,
    pub twist: f32,
    pub exposure: f32,
    pub texture: String,

    #[serde(skip)]
    pub loaded_texture: Option<Arc<Texture>>,
}

impl Default for TunnelLayer {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            speed: 0.5,
            rotation: 1.0,
            twist: 1.0,
            exposure: 0.7,
            texture: String::new(),
            loaded_texture: None,
        }
    }
}

impl PartialEq for TunnelLayer {
    fn eq(&self, other: &Self) -> bool {
        self.alpha == other.alpha
            && self.speed == other.speed
            && self.rotation == other.rotation
            && self.twist == other.twist
            && self.exposure == other.exposure
            && self.texture == other.texture
    }
}
