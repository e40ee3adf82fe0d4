use super::math::Color;
use super::tunnel::ComboState;
use serde::{Deserialize, Serialize};

/// `PostProcessingMod.json`: bloom and color grading per combo state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostProcessingMod {
    pub mod_this: bool,
    pub activate_state: String,
    pub use_cache: bool,
    pub normal: PostProcessingState,
    pub combo_x2: PostProcessingState,
    pub combo_x3: PostProcessingState,
    pub combo_x4: PostProcessingState,
    pub combo_long: PostProcessingState,
}

impl Default for PostProcessingMod {
    fn default() -> Self {
        Self {
            mod_this: true,
            activate_state: String::new(),
            use_cache: true,
            normal: PostProcessingState::default(),
            combo_x2: PostProcessingState::default(),
            combo_x3: PostProcessingState::default(),
            combo_x4: PostProcessingState::default(),
            combo_long: PostProcessingState::default(),
        }
    }
}

impl PostProcessingMod {
    pub fn states(&self) -> [&PostProcessingState; 5] {
        [
            &self.normal,
            &self.combo_x2,
            &self.combo_x3,
            &self.combo_x4,
            &self.combo_long,
        ]
    }

    pub fn state(&self, key: ComboState) -> &PostProcessingState {
        self.states()[key.index()]
    }

    pub fn active_state(&self) -> Option<ComboState> {
        if self.activate_state.is_empty() {
            None
        } else {
            ComboState::from_name(&self.activate_state)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostProcessingState {
    pub transition_time: f32,

    // Bloom
    pub intensity: f32,
    pub threshold: f32,
    /// 0 to 1.
    pub soft_knee: f32,
    /// 0 to 5.
    pub diffusion: f32,

    // White balance, -100 to 100
    pub temperature: f32,
    pub tint: f32,

    // Tone
    pub exposure: f32,
    pub color_filter: Color,
    /// -100 to 100.
    pub hue_shift: f32,
    /// -100 to 100.
    pub saturation: f32,
    /// -100 to 100.
    pub contrast: f32,
}

impl Default for PostProcessingState {
    fn default() -> Self {
        Self {
            transition_time: 0.3,
            intensity: 1.0,
            threshold: 0.8,
            soft_knee: 0.5,
            diffusion: 5.0,
            temperature: 0.0,
            tint: 0.0,
            exposure: 0.5,
            color_filter: Color::WHITE,
            hue_shift: 0.0,
            saturation: 0.0,
            contrast: 0.0,
        }
    }
}

impl PostProcessingState {
    /// Copy with every ranged parameter pulled into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            soft_knee: self.soft_knee.clamp(0.0, 1.0),
            diffusion: self.diffusion.clamp(0.0, 5.0),
            temperature: self.temperature.clamp(-100.0, 100.0),
            tint: self.tint.clamp(-100.0, 100.0),
            hue_shift: self.hue_shift.clamp(-100.0, 100.0),
            saturation: self.saturation.clamp(-100.0, 100.0),
            contrast: self.contrast.clamp(-100.0, 100.0),
            ..self.clone()
        }
    }
}
