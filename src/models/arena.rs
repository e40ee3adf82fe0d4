use crate::overrides::{ApplyContext, LightNode, ObjectNode, SkyboxOverride, paired_len};
use crate::target::{ArenaScene, SkyboxMaterial};
use serde::{Deserialize, Serialize};

/// `ArenaMod.json`: the override payload for one arena.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArenaMod {
    pub skybox: SkyboxOverride,

    #[serde(rename = "moddableGameObjects")]
    pub game_objects: Vec<ObjectNode>,

    #[serde(rename = "moddableLights")]
    pub lights: Vec<LightNode>,
}

impl ArenaMod {
    /// Describe `scene` as it is right now.
    ///
    /// [`restore_to`](Self::restore_to) puts the scene back to this state,
    /// including the skybox material it had at capture time.
    pub fn capture_from<S: ArenaScene + ?Sized>(scene: &S, ctx: &ApplyContext<'_>) -> Self {
        let game_objects = (0..scene.object_count())
            .filter_map(|i| scene.object(i))
            .map(|object| ObjectNode::capture_from(object, ctx))
            .collect();
        let lights = (0..scene.light_count())
            .filter_map(|i| scene.light(i))
            .map(|light| LightNode::capture_from(light, ctx))
            .collect();

        Self {
            skybox: SkyboxOverride::capture_from(scene),
            game_objects,
            lights,
        }
    }

    /// Push the payload onto `scene`.
    ///
    /// # Arguments
    /// * `built_skybox` - Material prepared by [`SkyboxOverride::build_material`]
    /// * `default_skybox` - Used when the payload brings no skybox of its own
    pub fn apply_to<S: ArenaScene + ?Sized>(
        &self,
        scene: &mut S,
        built_skybox: Option<SkyboxMaterial>,
        default_skybox: Option<&SkyboxMaterial>,
        ctx: &ApplyContext<'_>,
    ) {
        self.skybox.apply_to(scene, built_skybox, default_skybox);

        for i in 0..paired_len(self.game_objects.len(), scene.object_count()) {
            if let Some(object) = scene.object_mut(i) {
                self.game_objects[i].apply_to(object, ctx);
            }
        }
        for i in 0..paired_len(self.lights.len(), scene.light_count()) {
            if let Some(light) = scene.light_mut(i) {
                self.lights[i].apply_to(light, ctx);
            }
        }
    }

    /// Write a captured scene back onto `scene` in full.
    pub fn restore_to<S: ArenaScene + ?Sized>(
        &self,
        scene: &mut S,
        default_skybox: Option<&SkyboxMaterial>,
        ctx: &ApplyContext<'_>,
    ) {
        self.skybox.apply_to(scene, None, default_skybox);

        for i in 0..paired_len(self.game_objects.len(), scene.object_count()) {
            if let Some(object) = scene.object_mut(i) {
                self.game_objects[i].reinstate(object, ctx);
            }
        }
        for i in 0..paired_len(self.lights.len(), scene.light_count()) {
            if let Some(light) = scene.light_mut(i) {
                self.lights[i].reinstate(light, ctx);
            }
        }
    }

    /// Let this capture restore the activity of every object `payload`
    /// takes over. Gates once adopted stay.
    pub fn adopt_activity_gates(&mut self, payload: &ArenaMod) {
        for (recorded, node) in self.game_objects.iter_mut().zip(&payload.game_objects) {
            if node.enabled {
                recorded.fields.adopt_activity_gates(&node.fields);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let arena: ArenaMod = serde_json::from_str(
            r#"{
                "skybox": {"texture": "stars.png"},
                "moddableGameObjects": [{"modThis": true, "name": "Floor"}],
                "moddableLights": [{"modThis": true, "isActive": true, "intensity": 2.0}]
            }"#,
        )
        .unwrap();

        assert_eq!(arena.skybox.texture, "stars.png");
        assert_eq!(arena.game_objects[0].fields.name, "Floor");
        assert!(arena.lights[0].enabled);
        assert_eq!(arena.lights[0].fields.intensity, 2.0);
    }

    #[test]
    fn test_empty_document() {
        let arena: ArenaMod = serde_json::from_str("{}").unwrap();
        assert_eq!(arena, ArenaMod::default());
    }
}
