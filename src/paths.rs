//! Resolution of symbolic mod locations into filesystem paths.
//!
//! Mods can live next to the shipped application data (streaming root),
//! in the per-user writable area (persistent root), or at an absolute path.
//! The roots are supplied by the host through [`PathRoots`] instead of being
//! looked up from a global.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Where a relative mod path is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathBase {
    /// The path is used exactly as given.
    Absolute,
    /// Relative to the read-only application data shipped with the build.
    #[default]
    AppStreamingRoot,
    /// Relative to the writable per-user data directory.
    AppPersistentRoot,
}

/// Root directories the host process resolves paths against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRoots {
    pub streaming_root: Utf8PathBuf,
    pub persistent_root: Utf8PathBuf,
}

impl PathRoots {
    pub fn new(
        streaming_root: impl Into<Utf8PathBuf>,
        persistent_root: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            streaming_root: streaming_root.into(),
            persistent_root: persistent_root.into(),
        }
    }

    /// Both roots pointing at the same directory. Handy for tests and tools.
    pub fn single(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        Self {
            streaming_root: root.clone(),
            persistent_root: root,
        }
    }

    /// Resolve `relative` against the root selected by `base`.
    ///
    /// `Absolute` returns the input unchanged; the root variants produce
    /// `{root}/{relative}`.
    pub fn resolve(&self, base: PathBase, relative: &str) -> Utf8PathBuf {
        match base {
            PathBase::Absolute => Utf8PathBuf::from(relative),
            PathBase::AppStreamingRoot => {
                Utf8PathBuf::from(format!("{}/{}", self.streaming_root, relative))
            }
            PathBase::AppPersistentRoot => {
                Utf8PathBuf::from(format!("{}/{}", self.persistent_root, relative))
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but paths that are already rooted
    /// are passed through untouched.
    pub fn resolve_search_path(&self, base: PathBase, path: &str) -> Utf8PathBuf {
        if is_rooted(path) {
            Utf8PathBuf::from(path)
        } else {
            self.resolve(base, path)
        }
    }
}

/// True when `path` carries its own root (`/x`, `C:\x`, `\\server\x`).
pub fn is_rooted(path: &str) -> bool {
    let path = Utf8Path::new(path);
    path.has_root() || path.is_absolute()
}
