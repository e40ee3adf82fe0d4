use super::{ApplyContext, OverrideNode, Snapshot};
use crate::models::math::{Color, Transform, Vec3};
use crate::target::LightTarget;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightType {
    #[default]
    Directional,
    Point,
    Spot,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightShadows {
    #[default]
    None,
    Hard,
    Soft,
}

/// Photometric state of a light component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSettings {
    pub light_type: LightType,
    pub range: f32,
    pub spot_angle: f32,
    pub color: Color,
    pub intensity: f32,
    pub shadows: LightShadows,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            range: 10.0,
            spot_angle: 30.0,
            color: Color::WHITE,
            intensity: 0.5,
            shadows: LightShadows::None,
        }
    }
}

/// Which way the state-driven intensity controller is switched when a light
/// depends on game state.
///
/// Hosts disagree on whether their controller must be running (it fades on
/// its own) or stopped (it is driven externally and only reads the values)
/// while the light follows game state. The light is always captured and
/// restored consistently under the chosen policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateLightPolicy {
    /// Dependent lights get an enabled controller; others a disabled one.
    #[default]
    EnableWhenDependent,
    /// Dependent lights get a disabled controller; others an enabled one.
    DisableWhenDependent,
}

impl StateLightPolicy {
    /// Controller enabled flag for a light that is (or is not) dependent.
    pub fn controller_enabled(self, dependent: bool) -> bool {
        match self {
            StateLightPolicy::EnableWhenDependent => dependent,
            StateLightPolicy::DisableWhenDependent => !dependent,
        }
    }

    /// Inverse of [`controller_enabled`](Self::controller_enabled).
    pub fn is_dependent(self, controller_enabled: bool) -> bool {
        match self {
            StateLightPolicy::EnableWhenDependent => controller_enabled,
            StateLightPolicy::DisableWhenDependent => !controller_enabled,
        }
    }
}

/// Light override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LightFields {
    pub name: String,
    pub is_active: bool,
    /// Enabled flag of the light component, when recorded from a live light.
    /// Without it the component follows `is_active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_enabled: Option<bool>,

    pub position: Vec3,
    pub rotation: Vec3,

    #[serde(rename = "type")]
    pub light_type: LightType,
    pub range: f32,
    pub spot_angle: f32,
    pub color: Color,
    pub intensity: f32,
    pub shadows: LightShadows,

    /// Hand intensity over to the state-driven controller.
    pub dependent_on_game_state: bool,
    pub intensity_waiting: f32,
    pub intensity_playing: f32,
}

pub type LightNode = OverrideNode<LightFields>;

impl Default for LightFields {
    fn default() -> Self {
        let settings = LightSettings::default();
        Self {
            name: String::new(),
            is_active: true,
            light_enabled: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            light_type: settings.light_type,
            range: settings.range,
            spot_angle: settings.spot_angle,
            color: settings.color,
            intensity: settings.intensity,
            shadows: settings.shadows,
            dependent_on_game_state: false,
            intensity_waiting: 0.5,
            intensity_playing: 0.5,
        }
    }
}

impl LightFields {
    pub fn settings(&self) -> LightSettings {
        LightSettings {
            light_type: self.light_type,
            range: self.range,
            spot_angle: self.spot_angle,
            color: self.color,
            intensity: self.intensity,
            shadows: self.shadows,
        }
    }
}

impl<'t> Snapshot<dyn LightTarget + 't> for LightFields {
    fn capture_from(target: &(dyn LightTarget + 't), ctx: &ApplyContext<'_>) -> Self {
        let transform = target.local_transform();
        let settings = target.settings();
        let mut fields = Self {
            name: target.name().to_string(),
            is_active: target.is_active(),
            light_enabled: Some(target.is_enabled()),
            position: transform.position,
            rotation: transform.rotation,
            light_type: settings.light_type,
            range: settings.range,
            spot_angle: settings.spot_angle,
            color: settings.color,
            intensity: settings.intensity,
            shadows: settings.shadows,
            ..Default::default()
        };

        if let Some(controller) = target.state_controller() {
            fields.dependent_on_game_state = ctx.policy.is_dependent(controller.is_enabled());
            fields.intensity_waiting = controller.intensity_waiting();
            fields.intensity_playing = controller.intensity_playing();
        }
        fields
    }

    fn apply_fields(&self, target: &mut (dyn LightTarget + 't), ctx: &ApplyContext<'_>) {
        target.set_active(self.is_active);
        target.set_enabled(self.light_enabled.unwrap_or(self.is_active));
        if !self.is_active {
            return;
        }

        target.set_local_transform(Transform::new(self.position, self.rotation));
        target.set_settings(self.settings());

        let name = target.name().to_string();
        match target.state_controller_mut() {
            Some(controller) => {
                controller.set_enabled(ctx.policy.controller_enabled(self.dependent_on_game_state));
                if self.dependent_on_game_state {
                    controller.set_intensity_waiting(self.intensity_waiting);
                    controller.set_intensity_playing(self.intensity_playing);
                }
            }
            None if self.dependent_on_game_state => {
                tracing::warn!("Light '{}' cannot depend on game state; ignored", name);
            }
            None => {}
        }
    }

    fn restore_fields(&self, target: &mut (dyn LightTarget + 't), ctx: &ApplyContext<'_>) {
        target.set_active(self.is_active);
        target.set_enabled(self.light_enabled.unwrap_or(self.is_active));
        target.set_local_transform(Transform::new(self.position, self.rotation));
        target.set_settings(self.settings());

        if let Some(controller) = target.state_controller_mut() {
            controller.set_enabled(ctx.policy.controller_enabled(self.dependent_on_game_state));
            controller.set_intensity_waiting(self.intensity_waiting);
            controller.set_intensity_playing(self.intensity_playing);
        }
    }
}
