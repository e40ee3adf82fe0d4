//! Document loading with live reload.
//!
//! A [`FileWatchLoader`] loads one document type from one folder and keeps a
//! filesystem watch on the file it loaded. Notifications arrive on the
//! watcher's own thread; there the loader only decodes the file, swaps the
//! new value in and raises a dirty flag. Live targets are touched solely by
//! whoever calls [`FileWatchLoader::take_changed`] (the controller tick).

use crate::config::{ConfigStore, Document, LoadStatus, Loaded, SchemaError};
use camino::{Utf8Path, Utf8PathBuf};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to watch {path}: {source}")]
    Notify {
        path: Utf8PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0} has no containing directory to watch")]
    NoDirectory(Utf8PathBuf),
}

/// Observer called on the loading thread after every load.
pub type LoadedHook<T> = Arc<dyn Fn(&T, &LoadStatus) + Send + Sync>;

/// A filesystem watch bound to a single file.
///
/// The watch is placed on the containing directory and filtered down to the
/// file name, so the file may be created after the watch starts.
pub struct WatchedFile {
    path: Utf8PathBuf,
    active: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
}

impl WatchedFile {
    /// Start watching `path`; `on_change` runs on the notification thread
    /// for every write or create of that file.
    pub fn start<F>(path: &Utf8Path, on_change: F) -> Result<Self, WatchError>
    where
        F: Fn() + Send + 'static,
    {
        let directory = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .ok_or_else(|| WatchError::NoDirectory(path.to_path_buf()))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| WatchError::NoDirectory(path.to_path_buf()))?
            .to_string();

        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            if !flag.load(Ordering::Acquire) {
                return;
            }
            match result {
                Ok(event) => {
                    let is_write = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
                    let is_ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(OsStr::new(&file_name)));
                    if is_write && is_ours {
                        on_change();
                    }
                }
                Err(e) => tracing::warn!("File watch error: {}", e),
            }
        })
        .map_err(|source| WatchError::Notify {
            path: path.to_path_buf(),
            source,
        })?;

        watcher
            .watch(directory.as_std_path(), RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Notify {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Watching {}", path);
        Ok(Self {
            path: path.to_path_buf(),
            active,
            watcher: Some(watcher),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop delivery. Callbacks already running finish, later ones return
    /// immediately. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            tracing::debug!("Stopped watching {}", self.path);
        }
    }
}

impl Drop for WatchedFile {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for WatchedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchedFile")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}

/// State shared between the owning loader and its notification thread.
struct LoaderShared<T> {
    store: ConfigStore,
    latest: RwLock<Option<Arc<T>>>,
    resolved_path: RwLock<Option<Utf8PathBuf>>,
    last_status: RwLock<Option<LoadStatus>>,
    dirty: AtomicBool,
    on_loaded: RwLock<Option<LoadedHook<T>>>,
    /// Bumped whenever a watch starts or stops; reloads from older watches
    /// are dropped.
    generation: AtomicU64,
}

impl<T: Document> LoaderShared<T> {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Load from `base_path` and publish the value. A reload from a watch
    /// of `generation` publishes nothing once that watch is stale; `None`
    /// publishes unconditionally.
    fn reload(
        &self,
        base_path: &Utf8Path,
        generation: Option<u64>,
    ) -> Result<Option<Utf8PathBuf>, SchemaError> {
        let loaded = self.store.load_document::<T>(base_path)?;
        Ok(self.publish(loaded, generation))
    }

    fn publish(&self, loaded: Loaded<T>, generation: Option<u64>) -> Option<Utf8PathBuf> {
        let value = Arc::new(loaded.value);
        {
            let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
            if generation.is_some_and(|g| !self.is_current(g)) {
                tracing::debug!("Dropped reload of {} from a replaced watch", loaded.path);
                return None;
            }
            *latest = Some(Arc::clone(&value));
            *self.resolved_path.write().unwrap_or_else(PoisonError::into_inner) =
                Some(loaded.path.clone());
            *self.last_status.write().unwrap_or_else(PoisonError::into_inner) =
                Some(loaded.status.clone());
            self.dirty.store(true, Ordering::Release);
        }

        let hook = self
            .on_loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook(&value, &loaded.status);
        }

        tracing::debug!("Loaded {}", loaded.path);
        Some(loaded.path)
    }
}

/// Loads one document type from a folder and reloads it when it changes.
pub struct FileWatchLoader<T: Document> {
    shared: Arc<LoaderShared<T>>,
    base_path: Utf8PathBuf,
    watcher: Option<WatchedFile>,
}

impl<T: Document> FileWatchLoader<T> {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            shared: Arc::new(LoaderShared {
                store,
                latest: RwLock::new(None),
                resolved_path: RwLock::new(None),
                last_status: RwLock::new(None),
                dirty: AtomicBool::new(false),
                on_loaded: RwLock::new(None),
                generation: AtomicU64::new(0),
            }),
            base_path: Utf8PathBuf::new(),
            watcher: None,
        }
    }

    /// Point the loader at another folder.
    ///
    /// The existing watcher is kept until [`dispose_watcher`](Self::dispose_watcher)
    /// or the next [`load_file`](Self::load_file).
    pub fn set_base_path(&mut self, base_path: impl Into<Utf8PathBuf>) {
        self.base_path = base_path.into();
    }

    pub fn base_path(&self) -> &Utf8Path {
        &self.base_path
    }

    /// Install a read-only observer for loaded values.
    pub fn set_on_loaded<F>(&mut self, hook: F)
    where
        F: Fn(&T, &LoadStatus) + Send + Sync + 'static,
    {
        *self
            .shared
            .on_loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    /// Load `{base_path}/{schema name}.json` and make sure it is watched.
    ///
    /// The value is always loaded (defaults on missing or corrupt files);
    /// an `Err` means the value is there but no watch could be set up.
    pub fn load_file(&mut self) -> Result<Utf8PathBuf, WatchError> {
        let loaded = self.shared.store.load_document::<T>(&self.base_path)?;
        let path = loaded.path.clone();
        self.shared.publish(loaded, None);

        match &self.watcher {
            Some(watched) if watched.path() == path => {}
            Some(watched) => {
                tracing::warn!(
                    "Watcher on {} replaced by {}; dispose it before changing the base path",
                    watched.path(),
                    path
                );
                self.dispose_watcher();
                self.watch(&path)?;
            }
            None => self.watch(&path)?,
        }
        Ok(path)
    }

    fn watch(&mut self, path: &Utf8Path) -> Result<(), WatchError> {
        let shared = Arc::clone(&self.shared);
        let base_path = self.base_path.clone();
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let watched = WatchedFile::start(path, move || {
            if !shared.is_current(generation) {
                return;
            }
            tracing::info!("Change detected, reloading from {}", base_path);
            shared.store.metrics().record_watch_reload();
            if let Err(e) = shared.reload(&base_path, Some(generation)) {
                tracing::error!("Reload from {} failed: {}", base_path, e);
            }
        })?;
        self.watcher = Some(watched);
        Ok(())
    }

    pub fn dispose_watcher(&mut self) {
        if let Some(mut watched) = self.watcher.take() {
            self.shared.generation.fetch_add(1, Ordering::AcqRel);
            watched.dispose();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn watched_path(&self) -> Option<&Utf8Path> {
        self.watcher.as_ref().map(WatchedFile::path)
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty flag and hand out the newest value if it was set.
    ///
    /// Any number of reloads between two calls yield one value: the last.
    pub fn take_changed(&self) -> Option<Arc<T>> {
        if self.shared.dirty.swap(false, Ordering::AcqRel) {
            self.latest()
        } else {
            None
        }
    }

    /// Newest loaded value without touching the dirty flag.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.shared
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn resolved_path(&self) -> Option<Utf8PathBuf> {
        self.shared
            .resolved_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_status(&self) -> Option<LoadStatus> {
        self.shared
            .last_status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Document> Drop for FileWatchLoader<T> {
    fn drop(&mut self) {
        self.dispose_watcher();
    }
}
