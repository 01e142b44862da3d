//! Query results
//!
//! These are what the query service hands back to callers: catalog entries
//! with their name links resolved and, where asked for, source text inlined.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::asset::{AssetCategory, Instance, ObjectAsset, RoomAsset, SpriteAsset};
use crate::diagnostic::Diagnostic;
use crate::event::EventType;

/// A name link resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "name", rename_all = "snake_case")]
pub enum AssetLink {
    /// No link set
    None,
    /// Target exists in the catalog
    Resolved(String),
    /// Target name does not exist in the catalog
    Unresolved(String),
}

impl AssetLink {
    pub fn name(&self) -> Option<&str> {
        match self {
            AssetLink::None => None,
            AssetLink::Resolved(name) | AssetLink::Unresolved(name) => Some(name),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, AssetLink::Unresolved(_))
    }
}

impl std::fmt::Display for AssetLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetLink::None => f.write_str("None"),
            AssetLink::Resolved(name) => f.write_str(name),
            AssetLink::Unresolved(name) => write!(f, "{} (unresolved)", name),
        }
    }
}

/// Raw text of one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceText {
    /// Path relative to the project root
    pub relative_path: PathBuf,
    pub content: String,
    pub line_count: usize,
    /// Content was cut at the configured read cap
    pub truncated: bool,
}

/// One discovered source file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFileEntry {
    /// `"<asset> / <stem>"`
    pub display_name: String,
    pub relative_path: PathBuf,
    /// Descriptor of the asset owning the file, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_descriptor: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    pub event_type: EventType,
    pub display_name: String,
    pub source_path: PathBuf,
    /// Inlined source text
    pub source: Option<SourceText>,
    /// Why the source could not be inlined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetail {
    pub object: ObjectAsset,
    pub parent: AssetLink,
    pub sprite: AssetLink,
    pub mask_sprite: AssetLink,
    /// Objects naming this one as their parent
    pub children: Vec<String>,
    pub events: Vec<EventDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDetail {
    pub layer: String,
    pub instance: Instance,
    pub object: AssetLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetail {
    pub room: RoomAsset,
    pub instances: Vec<InstanceDetail>,
    /// Object names placed in the room but missing from the catalog
    pub unresolved_objects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDetail {
    pub sprite: SpriteAsset,
    /// Objects using this sprite
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub project_name: String,
    pub project_path: PathBuf,
    /// Project descriptor, relative to the root
    pub descriptor: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ide_version: Option<String>,
    pub counts: BTreeMap<AssetCategory, usize>,
    pub source_files: Vec<SourceFileEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    pub fn count(&self, category: AssetCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

/// One entry of an asset listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedAsset {
    pub name: String,
    /// Resource kind for the `Other` category (`sounds`, `fonts`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Source files belonging to the asset
    pub source_files: Vec<String>,
    pub has_descriptor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetListing {
    pub categories: BTreeMap<AssetCategory, Vec<ListedAsset>>,
}

impl AssetListing {
    pub fn names(&self, category: AssetCategory) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|assets| assets.iter().map(|a| a.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(|assets| assets.is_empty())
    }
}
