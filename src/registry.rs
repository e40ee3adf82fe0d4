use crate::config::{ConfigStore, LoadStatus};
use crate::models::{ModDescriptor, ModGroup};
use crate::paths::{PathBase, PathRoots};
use camino::Utf8Path;
use std::ffi::OsStr;
use walkdir::WalkDir;

/// Finds the mods that belong to a group.
#[derive(Debug, Clone)]
pub struct ModGroupRegistry {
    roots: PathRoots,
    store: ConfigStore,
}

impl ModGroupRegistry {
    pub fn new(roots: PathRoots, store: ConfigStore) -> Self {
        Self { roots, store }
    }

    /// Every mod descriptor under the group's search paths whose group key
    /// matches the group's.
    ///
    /// # Arguments
    /// * `path_base` - Anchor for relative search paths
    /// * `group` - Supplies the search paths (own first, then injected) and the key
    ///
    /// # Returns
    /// Descriptors in search path order, then directory walk order. Duplicates
    /// are kept; unreadable descriptors are skipped.
    pub fn discover(&self, path_base: PathBase, group: &ModGroup) -> Vec<ModDescriptor> {
        let file_name = match self.store.registry().name_of::<ModDescriptor>() {
            Ok(name) => format!("{name}.json"),
            Err(e) => {
                tracing::error!("Cannot discover mods: {}", e);
                return Vec::new();
            }
        };

        let mut found = Vec::new();
        for search_path in group.all_search_paths() {
            let root = self.roots.resolve_search_path(path_base, search_path);
            if !root.is_dir() {
                tracing::warn!("Search path {} does not exist, skipping", root);
                continue;
            }
            tracing::debug!("Searching for mods in {}", root);
            self.collect(&root, &file_name, &group.group_key, &mut found);
        }

        tracing::info!(
            "Found {} mod(s) for group '{}'",
            found.len(),
            group.group_key
        );
        found
    }

    fn collect(
        &self,
        root: &Utf8Path,
        file_name: &str,
        group_key: &str,
        found: &mut Vec<ModDescriptor>,
    ) {
        let entries = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root, e);
                    None
                }
            });

        for entry in entries {
            if !entry.file_type().is_file() || entry.file_name() != OsStr::new(file_name) {
                continue;
            }
            let Some(path) = Utf8Path::from_path(entry.path()) else {
                tracing::warn!("Skipping non UTF-8 path {}", entry.path().display());
                continue;
            };

            let loaded = self.store.load_path::<ModDescriptor>(path);
            if !matches!(loaded.status, LoadStatus::Loaded) {
                continue;
            }

            let mut descriptor = loaded.value;
            if descriptor.group_key != group_key {
                tracing::debug!(
                    "Ignoring {}: group '{}' is not '{}'",
                    path,
                    descriptor.group_key,
                    group_key
                );
                continue;
            }
            descriptor.resolved_folder_path = path.parent().map(Utf8Path::to_path_buf);
            found.push(descriptor);
        }
    }
}
