use crate::paths::is_rooted;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// The `ModGroup.json` pointer document.
///
/// Names which mod of a group is active and where compatible mods can be
/// found. Lives at the mods root configured by the host, not inside a mod
/// folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModGroup {
    #[serde(alias = "isGroupActive")]
    pub is_active: bool,

    /// Folder of the active mod, relative to the group root.
    #[serde(alias = "pathToCurrentMod")]
    pub active_mod_path: String,

    /// Compatibility key shared by every mod of this group (`Arena-Test`).
    #[serde(alias = "compatibleModsKey")]
    pub group_key: String,

    pub group_tag_category: String,
    pub group_tag: String,

    #[serde(alias = "pathsForMods")]
    pub search_paths: Vec<String>,

    /// Injected at runtime, appended after `search_paths`, never saved.
    #[serde(skip)]
    pub external_search_paths: Vec<String>,

    #[serde(skip)]
    pub(crate) root: Utf8PathBuf,
}

impl Default for ModGroup {
    fn default() -> Self {
        Self {
            is_active: true,
            active_mod_path: String::new(),
            group_key: String::new(),
            group_tag_category: String::new(),
            group_tag: String::new(),
            search_paths: Vec::new(),
            external_search_paths: Vec::new(),
            root: Utf8PathBuf::new(),
        }
    }
}

impl ModGroup {
    /// Explicit category, or the part of `group_key` before the first `-`.
    pub fn tag_category(&self) -> &str {
        if !self.group_tag_category.is_empty() {
            return &self.group_tag_category;
        }
        match self.group_key.split_once('-') {
            Some((category, _)) => category,
            None => &self.group_key,
        }
    }

    /// Explicit tag, or the part of `group_key` after the first `-`.
    pub fn tag(&self) -> &str {
        if !self.group_tag.is_empty() {
            return &self.group_tag;
        }
        match self.group_key.split_once('-') {
            Some((_, tag)) => tag,
            None => "",
        }
    }

    /// Anchor `active_mod_path` at `root` and report whether the resulting
    /// folder exists.
    ///
    /// The resolved path is only meaningful after this call; it is not
    /// refreshed when `active_mod_path` changes later.
    pub fn set_root(&mut self, root: impl Into<Utf8PathBuf>) -> bool {
        self.root = root.into();
        let resolved = self.resolved_base_path();
        let exists = resolved.is_dir();
        if !exists {
            tracing::debug!("Resolved mod folder {} does not exist", resolved);
        }
        exists
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `{root}/{active_mod_path}`; rooted mod paths ignore the root.
    pub fn resolved_base_path(&self) -> Utf8PathBuf {
        if self.root.as_str().is_empty() || is_rooted(&self.active_mod_path) {
            Utf8PathBuf::from(&self.active_mod_path)
        } else {
            self.root.join(&self.active_mod_path)
        }
    }

    /// Own search paths first, then injected ones.
    pub fn all_search_paths(&self) -> impl Iterator<Item = &str> {
        self.search_paths
            .iter()
            .chain(self.external_search_paths.iter())
            .map(String::as_str)
    }

    /// Inject a search path at runtime. Returns false for duplicates.
    pub fn add_external_search_path(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.search_paths.contains(&path) || self.external_search_paths.contains(&path) {
            return false;
        }
        self.external_search_paths.push(path);
        true
    }
}
