//! User settings and path mappings

use crate::catalog::{CatalogConfig, DEFAULT_HIDDEN_FOLDERS};
use crate::error::Result;
use crate::insert::InsertOptions;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Folder below the catalog root holding shared collections
pub const PUBLIC_COLLECTIONS_FOLDER: &str = "_public-collections";

/// How catalog geometry lands in the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertMode {
    /// One instance of a shared definition
    #[default]
    Block,
    /// The definition's objects copied out as loose objects in a named group
    Group,
}

/// Whether new definitions stay associated with their source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockLinkMode {
    /// Private copy
    #[default]
    Embedded,
    /// Copy linked to the source file
    Linked,
}

/// A path prefix rewrite, e.g. a mapped network drive to its mount point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Prefix as written in catalog files
    pub from: String,
    /// Prefix on this machine
    pub to: String,
}

impl PathMapping {
    /// Create a mapping
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Rewrite `path` if it starts with `from`, ignoring ASCII case
    ///
    /// When `to` uses forward slashes only, backslashes in the rest of the
    /// path are turned into forward slashes as well.
    pub fn apply(&self, path: &str) -> Option<String> {
        if self.from.is_empty() {
            return None;
        }
        let prefix = path.get(..self.from.len())?;
        if !prefix.eq_ignore_ascii_case(&self.from) {
            return None;
        }
        let rest = &path[self.from.len()..];
        let rest = if self.to.contains('/') && !self.to.contains('\\') {
            rest.replace('\\', "/")
        } else {
            rest.to_string()
        };
        Some(format!("{}{}", self.to, rest))
    }
}

/// Apply the first matching mapping, or return the path unchanged
pub fn map_path(path: &str, mappings: &[PathMapping]) -> PathBuf {
    mappings
        .iter()
        .find_map(|m| m.apply(path))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(path))
}

/// User settings, stored as camelCase JSON
///
/// Every field has a default, so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Catalog root
    pub base_server_path: PathBuf,
    /// Shared collections folder; empty means `_public-collections` below the root
    pub public_collections_path: PathBuf,
    /// Block or group insertion
    pub insert_as: InsertMode,
    /// Embedded or linked definitions
    pub insert_block_type: BlockLinkMode,
    /// Where packaging goes relative to its tool, in millimetres
    pub packaging_offset: [f64; 3],
    /// Spacing of the fallback layout grid, in millimetres
    pub grid_spacing: f64,
    /// Prefix rewrites applied to every path read from the catalog
    pub path_mappings: Vec<PathMapping>,
    /// Folder names the catalog scan skips
    pub hidden_folders: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_server_path: PathBuf::new(),
            public_collections_path: PathBuf::new(),
            insert_as: InsertMode::Block,
            insert_block_type: BlockLinkMode::Embedded,
            packaging_offset: [500.0, 0.0, 0.0],
            grid_spacing: 1200.0,
            path_mappings: Vec::new(),
            hidden_folders: DEFAULT_HIDDEN_FOLDERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Parse settings JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write a settings file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// The shared collections folder
    pub fn public_collections_path(&self) -> PathBuf {
        if self.public_collections_path.as_os_str().is_empty() {
            self.base_server_path.join(PUBLIC_COLLECTIONS_FOLDER)
        } else {
            self.public_collections_path.clone()
        }
    }

    /// Catalog configuration for the base server path
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig::new(&self.base_server_path).with_hidden_folders(self.hidden_folders.iter().cloned())
    }

    /// Insertion options from these settings
    pub fn insert_options(&self) -> InsertOptions {
        InsertOptions::new()
            .with_mode(self.insert_as)
            .with_link_mode(self.insert_block_type)
            .with_packaging_offset(Vector3::from(self.packaging_offset))
            .with_grid_spacing(self.grid_spacing)
            .with_path_mappings(self.path_mappings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings = Settings::from_json_str(r#"{"baseServerPath": "/mnt/db", "insertAs": "Group"}"#).unwrap();
        assert_eq!(settings.base_server_path, PathBuf::from("/mnt/db"));
        assert_eq!(settings.insert_as, InsertMode::Group);
        assert_eq!(settings.insert_block_type, BlockLinkMode::Embedded);
        assert_eq!(settings.packaging_offset, [500.0, 0.0, 0.0]);
        assert_eq!(settings.grid_spacing, 1200.0);
        assert_eq!(settings.hidden_folders.len(), DEFAULT_HIDDEN_FOLDERS.len());
        assert_eq!(
            settings.public_collections_path(),
            PathBuf::from("/mnt/db/_public-collections")
        );
    }

    #[test]
    fn test_unknown_enum_value_is_an_error() {
        assert!(Settings::from_json_str(r#"{"insertAs": "Sideways"}"#).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            insert_block_type: BlockLinkMode::Linked,
            path_mappings: vec![PathMapping::new("M:\\DB", "/mnt/db")],
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_path_mapping() {
        let mappings = vec![PathMapping::new("M:\\DB", "/mnt/db")];
        assert_eq!(
            map_path("m:\\db\\PRO\\Drills\\x.3mf", &mappings),
            PathBuf::from("/mnt/db/PRO/Drills/x.3mf")
        );
        assert_eq!(map_path("/local/x.3mf", &mappings), PathBuf::from("/local/x.3mf"));
        // Multi-byte characters never split a prefix comparison
        assert_eq!(map_path("ü", &mappings), PathBuf::from("ü"));
    }
}
