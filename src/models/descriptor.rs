use super::group::ModGroup;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// The `Mod.json` metadata record found in every mod folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModDescriptor {
    pub group_key: String,

    #[serde(alias = "modName")]
    pub name: String,

    #[serde(alias = "modVersion")]
    pub version: String,

    #[serde(alias = "modAuthor")]
    pub author: String,

    #[serde(alias = "modImage128x128")]
    pub preview_image_path: String,

    /// Whether resources referenced by this mod go through the shared cache.
    #[serde(alias = "useCache")]
    pub cache_enabled: bool,

    #[serde(alias = "basedOnMod")]
    pub derived_from_name: String,

    #[serde(alias = "basedOnModVersion")]
    pub derived_from_version: String,

    /// Folder the descriptor was discovered in.
    #[serde(skip)]
    pub resolved_folder_path: Option<Utf8PathBuf>,
}

impl Default for ModDescriptor {
    fn default() -> Self {
        Self {
            group_key: String::new(),
            name: String::new(),
            version: "0.0.1".to_string(),
            author: String::new(),
            preview_image_path: String::new(),
            cache_enabled: true,
            derived_from_name: String::new(),
            derived_from_version: String::new(),
            resolved_folder_path: None,
        }
    }
}

impl ModDescriptor {
    /// Seed a new descriptor from the group it is authored for.
    pub fn fill_from_group(&mut self, group: &ModGroup) {
        self.group_key = group.group_key.clone();
        self.name = group.active_mod_path.clone();
    }
}
