// Mod controller
//
// Drives the group -> mod -> payload load chain and is the only place that
// writes to live scene objects.

use crate::config::{StoreError, artifact_timestamp};
use crate::context::ModContext;
use crate::loader::FileWatchLoader;
use crate::models::{ArenaMod, ModDescriptor, ModGroup};
use crate::overrides::{ApplyContext, StateLightPolicy};
use crate::paths::{PathBase, is_rooted};
use crate::registry::ModGroupRegistry;
use crate::target::{ArenaScene, MeshLoader, SkyboxMaterial};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Where the controller is in the load/apply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Not started, or waiting for the readiness gate.
    Idle,
    /// Group file loaded (or waiting for a fix when its mod folder is missing).
    GroupLoading,
    /// Group switched off; defaults are in place.
    GroupInactive,
    /// Mod and payload loaders are being pointed at a new mod folder.
    PayloadLoading,
    /// A payload is being pushed onto the scene.
    Applying,
    /// Stable; waiting for the next file change.
    Watching,
}

/// Notifications for collaborators that react to mod changes.
#[derive(Clone, Debug, PartialEq)]
pub enum ModEvent {
    /// `ModGroup.json` was (re)loaded.
    GroupLoaded { base_path: Utf8PathBuf, active: bool },

    /// The group points at a folder that does not exist.
    BasePathMissing {
        base_path: Utf8PathBuf,
        error_file: Option<Utf8PathBuf>,
    },

    /// A payload was applied; emitted once per completed apply.
    ModApplied {
        group_key: String,
        mod_name: String,
        base_path: Utf8PathBuf,
    },

    /// The captured defaults were put back because the group is inactive.
    DefaultsRestored,
}

/// Host configuration for a [`ModController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerSettings {
    /// Anchor for `mods_root` and for relative search paths.
    pub path_base: PathBase,
    /// Folder holding `ModGroup.json` and error reports.
    pub mods_root: String,
    pub state_light_policy: StateLightPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            path_base: PathBase::AppStreamingRoot,
            mods_root: "Mods".to_string(),
            state_light_policy: StateLightPolicy::default(),
        }
    }
}

type ReadinessGate = Box<dyn Fn() -> bool + Send + Sync>;

/// Loads the active arena mod and keeps the scene in sync with it.
///
/// The controller owns the group, the active mod descriptor and payload,
/// and the three file loaders. Filesystem notifications only mark loaders
/// dirty; [`tick`](Self::tick) is the single point where changes reach the
/// scene.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new) records the scene's current state as defaults
/// 2. [`start`](Self::start) loads `ModGroup.json` once the readiness gate opens
/// 3. [`tick`](Self::tick) is called by the host on its update loop
/// 4. [`shutdown`](Self::shutdown) tears down every watcher
///
/// # Related Types
///
/// - [`ModContext`]: shared store, cache and metrics
/// - [`ModEvent`]: emitted through [`subscribe`](Self::subscribe)
pub struct ModController {
    context: ModContext,
    settings: ControllerSettings,
    ready: ReadinessGate,
    meshes: Option<Arc<dyn MeshLoader>>,
    skybox_template: SkyboxMaterial,
    default_skybox: Option<SkyboxMaterial>,

    group_loader: FileWatchLoader<ModGroup>,
    descriptor_loader: FileWatchLoader<ModDescriptor>,
    payload_loader: FileWatchLoader<ArenaMod>,

    group: ModGroup,
    descriptor: ModDescriptor,
    arena: Arc<ArenaMod>,
    defaults: ArenaMod,

    state: ControllerState,
    started: bool,
    initial_load: bool,
    payload_loaded: bool,
    apply_pending: bool,
    restore_pending: bool,

    events: broadcast::Sender<ModEvent>,
}

impl ModController {
    /// Create a controller for `scene` and record the scene's defaults.
    ///
    /// # Arguments
    /// * `context` - Shared mod services
    /// * `settings` - Where mods live and how lights are handed over
    /// * `scene` - The live arena, read once here
    pub fn new<S: ArenaScene + ?Sized>(
        context: ModContext,
        settings: ControllerSettings,
        scene: &S,
    ) -> Self {
        let ctx = ApplyContext::new(settings.state_light_policy);
        let defaults = ArenaMod::capture_from(scene, &ctx);
        let (events, _) = broadcast::channel(100);

        let mut group_loader = FileWatchLoader::new(context.store.clone());
        group_loader.set_on_loaded(|group: &ModGroup, status| {
            tracing::debug!(
                "Group document: active={}, mod='{}' ({:?})",
                group.is_active,
                group.active_mod_path,
                status
            );
        });

        tracing::debug!(
            "Captured defaults: {} object(s), {} light(s)",
            defaults.game_objects.len(),
            defaults.lights.len()
        );

        Self {
            descriptor_loader: FileWatchLoader::new(context.store.clone()),
            payload_loader: FileWatchLoader::new(context.store.clone()),
            group_loader,
            context,
            settings,
            ready: Box::new(|| true),
            meshes: None,
            skybox_template: SkyboxMaterial::panoramic(),
            default_skybox: scene.skybox().cloned(),
            group: ModGroup::default(),
            descriptor: ModDescriptor::default(),
            arena: Arc::new(ArenaMod::default()),
            defaults,
            state: ControllerState::Idle,
            started: false,
            initial_load: true,
            payload_loaded: false,
            apply_pending: false,
            restore_pending: false,
            events,
        }
    }

    /// Only load and apply while `gate` returns true.
    pub fn with_readiness_gate<F>(mut self, gate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.ready = Box::new(gate);
        self
    }

    pub fn with_mesh_loader(mut self, meshes: Arc<dyn MeshLoader>) -> Self {
        self.meshes = Some(meshes);
        self
    }

    /// Material cloned for every mod skybox.
    pub fn with_skybox_template(mut self, template: SkyboxMaterial) -> Self {
        self.skybox_template = template;
        self
    }

    /// Folder holding `ModGroup.json`.
    pub fn mods_root(&self) -> Utf8PathBuf {
        self.context
            .roots
            .resolve(self.settings.path_base, &self.settings.mods_root)
    }

    /// Arm the controller. Returns true when the group file was loaded right
    /// away, false when the readiness gate is still closed (the next ticks
    /// keep trying).
    pub fn start(&mut self) -> bool {
        self.started = true;
        if self.state == ControllerState::Idle {
            self.begin_loading()
        } else {
            true
        }
    }

    fn begin_loading(&mut self) -> bool {
        if !(self.ready)() {
            return false;
        }

        self.state = ControllerState::GroupLoading;
        let root = self.mods_root();
        tracing::info!("Loading mod group from {}", root);

        self.group_loader.set_base_path(root);
        if let Err(e) = self.group_loader.load_file() {
            tracing::warn!("Mod group changes will not be picked up: {}", e);
        }
        true
    }

    /// Consume pending file changes and apply them to `scene`.
    ///
    /// At most one apply happens per tick no matter how many notifications
    /// arrived since the last one.
    pub fn tick<S: ArenaScene + ?Sized>(&mut self, scene: &mut S) -> ControllerState {
        if !self.started {
            return self.state;
        }
        if self.state == ControllerState::Idle && !self.begin_loading() {
            return self.state;
        }

        if let Some(group) = self.group_loader.take_changed() {
            self.on_group_loaded(&group);
        }

        if self.restore_pending {
            if (self.ready)() {
                self.restore_defaults(scene);
            } else {
                tracing::debug!("Not ready, deferring restore");
            }
        }

        let payload_live = matches!(
            self.state,
            ControllerState::PayloadLoading | ControllerState::Applying | ControllerState::Watching
        );
        if payload_live && self.payload_loaded {
            if let Some(descriptor) = self.descriptor_loader.take_changed() {
                let mut descriptor = (*descriptor).clone();
                descriptor.resolved_folder_path = Some(self.group.resolved_base_path());
                self.descriptor = descriptor;
                self.apply_pending = true;
            }
            if let Some(arena) = self.payload_loader.take_changed() {
                self.arena = arena;
                self.apply_pending = true;
            }

            if self.apply_pending {
                if (self.ready)() {
                    self.apply(scene);
                } else {
                    tracing::debug!("Not ready, deferring apply");
                }
            }
        }

        self.state
    }

    fn on_group_loaded(&mut self, loaded: &ModGroup) {
        let previous = std::mem::replace(&mut self.group, loaded.clone());
        self.group.external_search_paths = previous.external_search_paths;
        self.state = ControllerState::GroupLoading;

        tracing::info!(
            "Mod group (re)loaded: new mod '{}', last mod '{}'",
            self.group.active_mod_path,
            previous.active_mod_path
        );

        let exists = self.check_base_path();
        let base_path = self.group.resolved_base_path();
        let _ = self.events.send(ModEvent::GroupLoaded {
            base_path: base_path.clone(),
            active: self.group.is_active,
        });

        if !exists {
            let message = format!("activeModPath '{}' does not seem to exist!", base_path);
            let error_file = self.write_error_file("ActiveModConfig", &message);
            let _ = self.events.send(ModEvent::BasePathMissing {
                base_path,
                error_file,
            });
            return;
        }

        if !self.group.is_active {
            tracing::info!("Mod group is not active, restoring defaults");
            self.deactivate();
            return;
        }

        if self.initial_load
            || previous.active_mod_path != self.group.active_mod_path
            || !self.payload_loaded
        {
            self.initial_load = false;
            self.load_payload();
        } else {
            tracing::warn!("Current mod was not changed");
            self.state = ControllerState::Watching;
        }
    }

    /// Anchor the group at the mods root (or nowhere for absolute mod paths)
    /// and report whether the mod folder exists.
    pub fn check_base_path(&mut self) -> bool {
        let root = if is_rooted(&self.group.active_mod_path) {
            Utf8PathBuf::new()
        } else {
            self.mods_root()
        };
        self.group.set_root(root)
    }

    fn load_payload(&mut self) {
        self.state = ControllerState::PayloadLoading;
        let base_path = self.group.resolved_base_path();
        tracing::info!("Loading mod from {}", base_path);

        self.payload_loader.dispose_watcher();
        self.payload_loader.set_base_path(&base_path);
        if let Err(e) = self.payload_loader.load_file() {
            tracing::warn!("Payload changes will not be picked up: {}", e);
        }

        self.descriptor_loader.dispose_watcher();
        self.descriptor_loader.set_base_path(&base_path);
        if let Err(e) = self.descriptor_loader.load_file() {
            tracing::warn!("Mod metadata changes will not be picked up: {}", e);
        }

        self.payload_loaded = true;
        self.apply_pending = true;
    }

    fn deactivate(&mut self) {
        self.state = ControllerState::GroupInactive;
        self.payload_loader.dispose_watcher();
        self.descriptor_loader.dispose_watcher();
        self.payload_loaded = false;
        self.apply_pending = false;
        self.restore_pending = true;
    }

    fn apply_context<'a>(&'a self, base_path: &'a Utf8Path) -> ApplyContext<'a> {
        let ctx = ApplyContext::new(self.settings.state_light_policy).with_base_path(base_path);
        match self.meshes.as_deref() {
            Some(meshes) => ctx.with_meshes(meshes),
            None => ctx,
        }
    }

    /// Put the scene back into the state recorded by [`new`](Self::new).
    pub fn restore_defaults<S: ArenaScene + ?Sized>(&mut self, scene: &mut S) {
        let base_path = Utf8PathBuf::new();
        let ctx = self.apply_context(&base_path);
        self.defaults
            .restore_to(scene, self.default_skybox.as_ref(), &ctx);
        self.restore_pending = false;

        self.context.metrics.record_restore();
        let _ = self.events.send(ModEvent::DefaultsRestored);
    }

    fn apply<S: ArenaScene + ?Sized>(&mut self, scene: &mut S) {
        self.state = ControllerState::Applying;
        let base_path = self.group.resolved_base_path();
        tracing::info!("Applying arena mod changes from {}", base_path);

        let built = self.arena.skybox.build_material(
            &self.skybox_template,
            &self.context.cache,
            &base_path,
            self.descriptor.cache_enabled,
        );

        self.defaults.adopt_activity_gates(&self.arena);
        let ctx = self.apply_context(&base_path);
        let default_skybox = self.default_skybox.as_ref();
        self.defaults.restore_to(scene, default_skybox, &ctx);
        self.arena.apply_to(scene, built, default_skybox, &ctx);
        self.restore_pending = false;

        self.context.metrics.record_apply();
        self.apply_pending = false;
        self.state = ControllerState::Watching;

        let _ = self.events.send(ModEvent::ModApplied {
            group_key: self.group.group_key.clone(),
            mod_name: self.descriptor.name.clone(),
            base_path,
        });
    }

    /// Stop every watcher and go back to idle.
    pub fn shutdown(&mut self) {
        self.group_loader.dispose_watcher();
        self.descriptor_loader.dispose_watcher();
        self.payload_loader.dispose_watcher();
        self.started = false;
        self.state = ControllerState::Idle;

        tracing::info!("Mod controller shut down");
        self.context.metrics.log_summary();
    }

    /// Subscribe to [`ModEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<ModEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn group(&self) -> &ModGroup {
        &self.group
    }

    pub fn descriptor(&self) -> &ModDescriptor {
        &self.descriptor
    }

    /// Payload currently in effect.
    pub fn arena(&self) -> &Arc<ArenaMod> {
        &self.arena
    }

    /// Scene state recorded at construction.
    pub fn defaults(&self) -> &ArenaMod {
        &self.defaults
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn context(&self) -> &ModContext {
        &self.context
    }

    /// Make `mod_path` the active mod and persist the group.
    ///
    /// The saved file is picked up by the group watcher and reloads the mod
    /// even if the path did not change.
    pub fn activate_mod(&mut self, mod_path: &str) -> Option<Utf8PathBuf> {
        self.group.active_mod_path = mod_path.to_string();
        self.initial_load = true;
        self.save_group()
    }

    /// Write `ModGroup.json` into the mods root.
    pub fn save_group(&self) -> Option<Utf8PathBuf> {
        let root = self.mods_root();
        absorb(self.context.store.save_document(&root, &self.group))
    }

    /// Fill the descriptor from the group and the payload from `scene`,
    /// ready for [`save_mod`](Self::save_mod).
    pub fn capture_setup<S: ArenaScene + ?Sized>(&mut self, scene: &S) {
        self.descriptor.fill_from_group(&self.group);
        let base_path = self.group.resolved_base_path();
        let arena = ArenaMod::capture_from(scene, &self.apply_context(&base_path));
        self.arena = Arc::new(arena);
    }

    /// Write `Mod.json` and `ArenaMod.json` into the active mod folder.
    pub fn save_mod(&mut self) -> bool {
        self.check_base_path();
        let base_path = self.group.resolved_base_path();

        let descriptor = absorb(self.context.store.save_document(&base_path, &self.descriptor));
        let arena = absorb(self.context.store.save_document(&base_path, self.arena.as_ref()));
        descriptor.is_some() && arena.is_some()
    }

    /// Mods compatible with the current group.
    pub fn discover_mods(&self) -> Vec<ModDescriptor> {
        ModGroupRegistry::new(self.context.roots.clone(), self.context.store.clone())
            .discover(self.settings.path_base, &self.group)
    }

    /// Add a search path for [`discover_mods`](Self::discover_mods) that is
    /// not saved with the group.
    pub fn add_external_search_path(&mut self, path: impl Into<String>) -> bool {
        self.group.add_external_search_path(path)
    }

    /// Log `message` and write it to `{mods_root}/{logical_name}_error_{timestamp}.txt`.
    pub fn write_error_file(&self, logical_name: &str, message: &str) -> Option<Utf8PathBuf> {
        tracing::error!("{}", message);

        let path = self
            .mods_root()
            .join(format!("{}_error_{}.txt", logical_name, artifact_timestamp()));
        match write_report(&path, message) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::error!("Could not write error report: {:#}", e);
                None
            }
        }
    }
}

// Write failures are logged by the store itself; schema lookups fail before it.
fn absorb(result: Result<Utf8PathBuf, StoreError>) -> Option<Utf8PathBuf> {
    match result {
        Ok(path) => Some(path),
        Err(StoreError::Schema(e)) => {
            tracing::error!("Could not save: {}", e);
            None
        }
        Err(_) => None,
    }
}

fn write_report(path: &Utf8Path, message: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent))?;
    }
    fs::write(path, message).with_context(|| format!("Failed to write: {}", path))
}
