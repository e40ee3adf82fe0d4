//! Snapshot, apply and restore for live targets.
//!
//! Every override node carries an `enabled` flag (`modThis` on disk), the
//! fields to push onto its target, and the target's original fields. The
//! original is captured the first time the node is applied and never again,
//! so restoring always returns to the state the target had before this node
//! first touched it. The captured original has the same shape as the
//! override but is written back in full: the gates an override honours (an
//! inactive light skips its photometrics) do not hold back a restore.
//!
//! List-shaped children pair up by index; the shorter list wins and the
//! remainder of the longer one is left alone.

pub mod light;
pub mod object;
pub mod renderer;
pub mod skybox;

pub use light::{LightFields, LightNode, LightSettings, LightShadows, LightType, StateLightPolicy};
pub use object::{ObjectFields, ObjectNode};
pub use renderer::{RendererFields, RendererNode};
pub use skybox::SkyboxOverride;

use crate::target::MeshLoader;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Host-side inputs an apply pass may need.
#[derive(Clone, Copy)]
pub struct ApplyContext<'a> {
    pub policy: StateLightPolicy,
    /// Folder of the active mod; relative asset references resolve here.
    pub base_path: &'a Utf8Path,
    pub meshes: Option<&'a dyn MeshLoader>,
}

impl<'a> ApplyContext<'a> {
    pub fn new(policy: StateLightPolicy) -> Self {
        Self {
            policy,
            base_path: Utf8Path::new(""),
            meshes: None,
        }
    }

    pub fn with_base_path(mut self, base_path: &'a Utf8Path) -> Self {
        self.base_path = base_path;
        self
    }

    pub fn with_meshes(mut self, meshes: &'a dyn MeshLoader) -> Self {
        self.meshes = Some(meshes);
        self
    }
}

impl Default for ApplyContext<'_> {
    fn default() -> Self {
        Self::new(StateLightPolicy::default())
    }
}

impl fmt::Debug for ApplyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyContext")
            .field("policy", &self.policy)
            .field("base_path", &self.base_path)
            .field("meshes", &self.meshes.is_some())
            .finish()
    }
}

/// Field set that can be read from and written to a target of type `T`.
pub trait Snapshot<T: ?Sized> {
    /// Record the target's current state.
    fn capture_from(target: &T, ctx: &ApplyContext<'_>) -> Self;

    /// Record the target's state as the original of `overriding`, which is
    /// `None` when the node is disabled and will not touch the target.
    fn capture_original(target: &T, _overriding: Option<&Self>, ctx: &ApplyContext<'_>) -> Self
    where
        Self: Sized,
    {
        Self::capture_from(target, ctx)
    }

    /// Push these fields onto the target, recursing into children.
    fn apply_fields(&self, target: &mut T, ctx: &ApplyContext<'_>);

    /// Write recorded fields back onto the target.
    fn restore_fields(&self, target: &mut T, ctx: &ApplyContext<'_>) {
        self.apply_fields(target, ctx);
    }
}

/// One unit of an override tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideNode<P> {
    #[serde(rename = "modThis", default)]
    pub enabled: bool,

    #[serde(flatten)]
    pub fields: P,

    #[serde(skip)]
    original: OnceLock<P>,
}

impl<P> OverrideNode<P> {
    pub fn new(enabled: bool, fields: P) -> Self {
        Self {
            enabled,
            fields,
            original: OnceLock::new(),
        }
    }

    /// Node describing `target` exactly as it is now, enabled.
    pub fn capture_from<T: ?Sized>(target: &T, ctx: &ApplyContext<'_>) -> Self
    where
        P: Snapshot<T>,
    {
        Self::new(true, P::capture_from(target, ctx))
    }

    /// Apply this node to `target`.
    ///
    /// The first call records the target's original fields. A disabled node
    /// stops there and leaves the target untouched.
    pub fn apply_to<T: ?Sized>(&self, target: &mut T, ctx: &ApplyContext<'_>)
    where
        P: Snapshot<T>,
    {
        self.original
            .get_or_init(|| P::capture_original(&*target, self.enabled.then_some(&self.fields), ctx));

        if !self.enabled {
            return;
        }
        self.fields.apply_fields(target, ctx);
    }

    /// The fields recorded on first apply, if that happened yet.
    pub fn original(&self) -> Option<&P> {
        self.original.get()
    }

    /// Put the recorded original back. Returns false when nothing was
    /// recorded yet (the node never touched the target).
    pub fn restore<T: ?Sized>(&self, target: &mut T, ctx: &ApplyContext<'_>) -> bool
    where
        P: Snapshot<T>,
    {
        match self.original.get() {
            Some(original) => {
                original.restore_fields(target, ctx);
                true
            }
            None => false,
        }
    }

    /// Write a captured node back onto `target` in full.
    ///
    /// For trees built by [`capture_from`](Self::capture_from); overrides go
    /// through [`apply_to`](Self::apply_to).
    pub fn reinstate<T: ?Sized>(&self, target: &mut T, ctx: &ApplyContext<'_>)
    where
        P: Snapshot<T>,
    {
        self.fields.restore_fields(target, ctx);
    }
}

impl<P: Default> Default for OverrideNode<P> {
    fn default() -> Self {
        Self::new(false, P::default())
    }
}

impl<P: PartialEq> PartialEq for OverrideNode<P> {
    fn eq(&self, other: &Self) -> bool {
        self.enabled == other.enabled && self.fields == other.fields
    }
}

/// Number of positional pairs between an override list and a target list.
pub fn paired_len(overrides: usize, targets: usize) -> usize {
    overrides.min(targets)
}
