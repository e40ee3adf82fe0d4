use super::renderer::RendererNode;
use super::{ApplyContext, OverrideNode, Snapshot, paired_len};
use crate::models::math::{Transform, Vec3};
use crate::target::ObjectTarget;
use serde::{Deserialize, Serialize};

/// Positioned object override with nested renderers and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectFields {
    pub name: String,

    /// Gate for `is_active`. Objects whose activity is driven by the game
    /// must keep this off.
    pub override_active: bool,
    pub is_active: bool,

    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,

    #[serde(rename = "moddableRenderers")]
    pub renderers: Vec<RendererNode>,

    #[serde(rename = "moddableChildren")]
    pub children: Vec<ObjectNode>,
}

pub type ObjectNode = OverrideNode<ObjectFields>;

impl Default for ObjectFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            override_active: false,
            is_active: true,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            renderers: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl ObjectFields {
    /// Take over the activity gate wherever `overriding` (or one of its
    /// enabled children, paired by index) overrides activity, so restoring
    /// this record puts that activity back.
    pub fn adopt_activity_gates(&mut self, overriding: &ObjectFields) {
        if overriding.override_active {
            self.override_active = true;
        }
        for (recorded, node) in self.children.iter_mut().zip(&overriding.children) {
            if node.enabled {
                recorded.fields.adopt_activity_gates(&node.fields);
            }
        }
    }
}

impl<'t> Snapshot<dyn ObjectTarget + 't> for ObjectFields {
    /// Records the whole subtree. `override_active` stays off, so a
    /// captured object never takes over activity it did not own.
    fn capture_from(target: &(dyn ObjectTarget + 't), ctx: &ApplyContext<'_>) -> Self {
        let transform = target.local_transform();

        let renderers = (0..target.renderer_count())
            .filter_map(|i| target.renderer(i))
            .map(|renderer| RendererNode::capture_from(renderer, ctx))
            .collect();
        let children = (0..target.child_count())
            .filter_map(|i| target.child(i))
            .map(|child| ObjectNode::capture_from(child, ctx))
            .collect();

        Self {
            name: target.name().to_string(),
            override_active: false,
            is_active: target.is_active(),
            position: transform.position,
            rotation: transform.rotation,
            renderers,
            children,
        }
    }

    fn capture_original(
        target: &(dyn ObjectTarget + 't),
        overriding: Option<&Self>,
        ctx: &ApplyContext<'_>,
    ) -> Self {
        let mut original = Self::capture_from(target, ctx);
        if let Some(overriding) = overriding {
            original.adopt_activity_gates(overriding);
        }
        original
    }

    fn apply_fields(&self, target: &mut (dyn ObjectTarget + 't), ctx: &ApplyContext<'_>) {
        if self.override_active {
            target.set_active(self.is_active);
        }
        target.set_local_transform(Transform::new(self.position, self.rotation));

        for i in 0..paired_len(self.renderers.len(), target.renderer_count()) {
            if let Some(renderer) = target.renderer_mut(i) {
                self.renderers[i].apply_to(renderer, ctx);
            }
        }
        for i in 0..paired_len(self.children.len(), target.child_count()) {
            if let Some(child) = target.child_mut(i) {
                self.children[i].apply_to(child, ctx);
            }
        }
    }

    fn restore_fields(&self, target: &mut (dyn ObjectTarget + 't), ctx: &ApplyContext<'_>) {
        if self.override_active {
            target.set_active(self.is_active);
        }
        target.set_local_transform(Transform::new(self.position, self.rotation));

        for i in 0..paired_len(self.renderers.len(), target.renderer_count()) {
            if let Some(renderer) = target.renderer_mut(i) {
                self.renderers[i].reinstate(renderer, ctx);
            }
        }
        for i in 0..paired_len(self.children.len(), target.child_count()) {
            if let Some(child) = target.child_mut(i) {
                self.children[i].reinstate(child, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{MeshHandle, RendererTarget};

    #[derive(Default)]
    struct Lamp {
        enabled: bool,
    }

    impl RendererTarget for Lamp {
        fn name(&self) -> &str {
            "lamp"
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn mesh(&self) -> Option<MeshHandle> {
            None
        }
        fn set_mesh(&mut self, _mesh: MeshHandle) {}
    }

    #[derive(Default)]
    struct Post {
        active: bool,
        transform: Transform,
        renderers: Vec<Lamp>,
        children: Vec<Post>,
    }

    impl ObjectTarget for Post {
        fn name(&self) -> &str {
            "post"
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
        fn local_transform(&self) -> Transform {
            self.transform
        }
        fn set_local_transform(&mut self, transform: Transform) {
            self.transform = transform;
        }
        fn renderer_count(&self) -> usize {
            self.renderers.len()
        }
        fn renderer(&self, index: usize) -> Option<&dyn RendererTarget> {
            self.renderers.get(index).map(|r| r as &dyn RendererTarget)
        }
        fn renderer_mut(&mut self, index: usize) -> Option<&mut dyn RendererTarget> {
            self.renderers
                .get_mut(index)
                .map(|r| r as &mut dyn RendererTarget)
        }
        fn child_count(&self) -> usize {
            self.children.len()
        }
        fn child(&self, index: usize) -> Option<&dyn ObjectTarget> {
            self.children.get(index).map(|c| c as &dyn ObjectTarget)
        }
        fn child_mut(&mut self, index: usize) -> Option<&mut dyn ObjectTarget> {
            self.children.get_mut(index).map(|c| c as &mut dyn ObjectTarget)
        }
    }

    fn post_with_children(count: usize) -> Post {
        Post {
            active: true,
            children: (0..count)
                .map(|_| Post {
                    active: true,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn moved(x: f32) -> ObjectNode {
        ObjectNode::new(
            true,
            ObjectFields {
                position: Vec3::new(x, 0.0, 0.0),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_active_only_with_gate() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(0);
        let mut fields = ObjectFields {
            is_active: false,
            ..Default::default()
        };

        fields.apply_fields(&mut post as &mut dyn ObjectTarget, &ctx);
        assert!(post.active);

        fields.override_active = true;
        fields.apply_fields(&mut post as &mut dyn ObjectTarget, &ctx);
        assert!(!post.active);
    }

    #[test]
    fn test_children_pair_by_index() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(3);
        post.children[2].transform.position = Vec3::new(-7.0, -7.0, -7.0);
        let node = ObjectNode::new(
            true,
            ObjectFields {
                children: vec![moved(1.0), moved(2.0)],
                ..Default::default()
            },
        );

        node.apply_to(&mut post as &mut dyn ObjectTarget, &ctx);

        assert_eq!(post.children[0].transform.position.x, 1.0);
        assert_eq!(post.children[1].transform.position.x, 2.0);
        assert_eq!(post.children[2].transform.position, Vec3::new(-7.0, -7.0, -7.0));
    }

    #[test]
    fn test_more_overrides_than_children() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(1);
        let node = ObjectNode::new(
            true,
            ObjectFields {
                children: vec![moved(1.0), moved(2.0), moved(3.0)],
                ..Default::default()
            },
        );

        node.apply_to(&mut post as &mut dyn ObjectTarget, &ctx);

        assert_eq!(post.children.len(), 1);
        assert_eq!(post.children[0].transform.position.x, 1.0);
    }

    #[test]
    fn test_capture_records_subtree() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(2);
        post.renderers.push(Lamp { enabled: true });
        post.children[1].transform.rotation = Vec3::new(0.0, 90.0, 0.0);

        let node = ObjectNode::capture_from(&post as &dyn ObjectTarget, &ctx);

        assert!(node.enabled);
        assert!(!node.fields.override_active);
        assert_eq!(node.fields.renderers.len(), 1);
        assert!(node.fields.renderers[0].fields.enabled);
        assert_eq!(node.fields.children.len(), 2);
        assert_eq!(node.fields.children[1].fields.rotation.y, 90.0);
    }

    #[test]
    fn test_restore_puts_subtree_back() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(2);
        post.renderers.push(Lamp { enabled: true });
        let node = ObjectNode::new(
            true,
            ObjectFields {
                position: Vec3::new(5.0, 5.0, 5.0),
                renderers: vec![RendererNode::new(
                    true,
                    crate::overrides::RendererFields {
                        enabled: false,
                        ..Default::default()
                    },
                )],
                children: vec![moved(9.0)],
                ..Default::default()
            },
        );

        node.apply_to(&mut post as &mut dyn ObjectTarget, &ctx);
        assert!(!post.renderers[0].enabled);
        node.restore(&mut post as &mut dyn ObjectTarget, &ctx);

        assert_eq!(post.transform.position, Vec3::ZERO);
        assert!(post.renderers[0].enabled);
        assert_eq!(post.children[0].transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_restore_reactivates_hidden_subtree() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(2);
        let hide = |children| ObjectFields {
            override_active: true,
            is_active: false,
            children,
            ..Default::default()
        };
        let node = ObjectNode::new(
            true,
            hide(vec![ObjectNode::default(), ObjectNode::new(true, hide(Vec::new()))]),
        );

        node.apply_to(&mut post as &mut dyn ObjectTarget, &ctx);
        assert!(!post.active);
        assert!(!post.children[1].active);
        node.restore(&mut post as &mut dyn ObjectTarget, &ctx);

        assert!(post.active);
        assert!(post.children[0].active);
        assert!(post.children[1].active);
        let original = node.original().unwrap();
        assert!(original.override_active);
        assert!(!original.children[0].fields.override_active);
        assert!(original.children[1].fields.override_active);
    }

    #[test]
    fn test_disabled_node_claims_no_activity() {
        let ctx = ApplyContext::default();
        let mut post = post_with_children(0);
        let node = ObjectNode::new(
            false,
            ObjectFields {
                override_active: true,
                is_active: false,
                ..Default::default()
            },
        );

        node.apply_to(&mut post as &mut dyn ObjectTarget, &ctx);

        assert!(post.active);
        assert!(!node.original().unwrap().override_active);
    }

    #[test]
    fn test_document_field_names() {
        let node: ObjectNode = serde_json::from_str(
            r#"{"modThis": true, "name": "Pillar", "position": {"x": 1, "y": 2, "z": 3},
                "moddableRenderers": [{"enabled": false}], "moddableChildren": [{}]}"#,
        )
        .unwrap();

        assert!(node.enabled);
        assert_eq!(node.fields.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(!node.fields.renderers[0].enabled);
        assert!(!node.fields.renderers[0].fields.enabled);
        assert!(!node.fields.children[0].enabled);
    }
}
