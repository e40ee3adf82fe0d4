// arenamod - live-reloading mod overrides for arena scenes
//
// Loads JSON mod documents, watches them for edits and applies them as
// overrides onto host objects, restoring the original state when a mod is
// switched off.

pub mod cache;
pub mod config;
pub mod context;
pub mod controller;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod overrides;
pub mod paths;
pub mod registry;
pub mod target;

// Re-export commonly used types for convenience
pub use cache::{ResourceCache, Texture, TextureKind};
pub use config::{ConfigStore, LoadStatus, Loaded, SchemaRegistry};
pub use context::ModContext;
pub use controller::{ControllerSettings, ControllerState, ModController, ModEvent};
pub use loader::{FileWatchLoader, WatchError};
pub use metrics::ModMetrics;
pub use models::{ArenaMod, ModDescriptor, ModGroup, PostProcessingMod, TunnelMod};
pub use overrides::{ApplyContext, OverrideNode, Snapshot, StateLightPolicy};
pub use paths::{PathBase, PathRoots};
pub use registry::ModGroupRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
