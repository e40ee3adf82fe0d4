use super::{ApplyContext, OverrideNode, Snapshot};
use crate::target::{MeshHandle, RendererTarget};
use serde::{Deserialize, Serialize};

/// Renderer override: visibility plus an optional geometry swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererFields {
    pub name: String,
    pub enabled: bool,
    /// Model reference, relative to the mod folder.
    pub model_override: String,

    /// Geometry recorded from a live renderer.
    #[serde(skip)]
    pub mesh: Option<MeshHandle>,
}

pub type RendererNode = OverrideNode<RendererFields>;

impl Default for RendererFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            model_override: String::new(),
            mesh: None,
        }
    }
}

impl PartialEq for RendererFields {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.enabled == other.enabled
            && self.model_override == other.model_override
    }
}

impl<'t> Snapshot<dyn RendererTarget + 't> for RendererFields {
    fn capture_from(target: &(dyn RendererTarget + 't), _ctx: &ApplyContext<'_>) -> Self {
        Self {
            name: target.name().to_string(),
            enabled: target.is_enabled(),
            model_override: String::new(),
            mesh: target.mesh(),
        }
    }

    fn apply_fields(&self, target: &mut (dyn RendererTarget + 't), ctx: &ApplyContext<'_>) {
        target.set_enabled(self.enabled);

        if let Some(mesh) = &self.mesh {
            target.set_mesh(mesh.clone());
            return;
        }
        if self.model_override.is_empty() {
            return;
        }

        let loaded = ctx
            .meshes
            .and_then(|loader| loader.load_mesh(ctx.base_path, &self.model_override));
        match loaded {
            Some(mesh) => {
                tracing::debug!("Swapped geometry of '{}' to {}", target.name(), mesh);
                target.set_mesh(mesh);
            }
            None => tracing::warn!(
                "Could not load model '{}' for renderer '{}'; keeping its geometry",
                self.model_override,
                target.name()
            ),
        }
    }
}
