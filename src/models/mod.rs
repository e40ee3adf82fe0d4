//! Documents read from and written to mod folders.
//!
//! - [`ModGroup`]: `ModGroup.json`, which mod of a group is active and where mods live
//! - [`ModDescriptor`]: `Mod.json`, metadata present in every mod folder
//! - [`ArenaMod`]: `ArenaMod.json`, skybox, object and light overrides for an arena
//! - [`TunnelMod`] / [`PostProcessingMod`]: per-combo-state visual parameters
//!
//! # Architecture Note
//!
//! Every document derives `Serialize`/`Deserialize` with `#[serde(default)]`,
//! so a partial file fills the rest from defaults. Runtime-only handles
//! (resolved folders, decoded textures, captured originals) are
//! `#[serde(skip)]` and never reach disk.

pub mod arena;
pub mod descriptor;
pub mod group;
pub mod math;
pub mod post_processing;
pub mod tunnel;

pub use arena::ArenaMod;
pub use descriptor::ModDescriptor;
pub use group::ModGroup;
pub use math::{Color, Transform, Vec3};
pub use post_processing::{PostProcessingMod, PostProcessingState};
pub use tunnel::{ComboState, TunnelLayer, TunnelMod, TunnelState};
